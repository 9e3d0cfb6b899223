use core::{iter, ops::Deref};
use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::Context;
use beam::{Ray, Surface};
use beam_json::{serde_json, JsonSer, JsonType, ReflectorConfig};
use beam_mirrors::*;
use beam_random::{
    gen_rand_mirrors,
    rand::{rngs::StdRng, Rng, SeedableRng},
    Random,
};
use clap::Parser;
use log::{info, LevelFilter};

trait JsonTypeDyn {
    fn json_type_dyn(&self) -> String;
}

impl<T: JsonType + ?Sized> JsonTypeDyn for T {
    fn json_type_dyn(&self) -> String {
        Self::json_type()
    }
}

trait JsonSerDyn: JsonSer + JsonTypeDyn {}

impl<T: JsonSer + JsonTypeDyn> JsonSerDyn for T {}

/// A mirror of any type, serialized along with its type name and, if it has one, its tag.
struct Dynamic<T, const D: usize> {
    mirror: T,
    surface: Surface,
}

impl<T, const D: usize> Dynamic<T, D> {
    fn untagged(mirror: T) -> Self {
        Self {
            mirror,
            surface: Surface::default(),
        }
    }
}

impl<const D: usize> Random for Dynamic<Box<dyn JsonSerDyn>, D> {
    fn random(rng: &mut (impl Rng + ?Sized)) -> Self {
        let mirror = match rng.gen_range(0usize..4) {
            0 => Box::new(PlaneMirror::<D>::random(rng)) as Box<dyn JsonSerDyn>,
            1 => Box::new(Simplex::<D>::random(rng)),
            2 => Box::new(Sphere::<D>::random(rng)),
            _ => Box::new(Cuboid::<D>::random(rng)),
        };

        Self {
            mirror,
            surface: Surface::random(rng),
        }
    }
}

impl<T: Deref, const D: usize> JsonSer for Dynamic<T, D>
where
    T::Target: JsonTypeDyn + JsonSer,
{
    fn to_json(&self) -> serde_json::Value {
        let mut json = serde_json::json!({
            "type": self.mirror.deref().json_type_dyn(),
            "data": self.mirror.deref().to_json(),
        });

        if self.surface != Surface::default() {
            json["tag"] = self.surface.to_json();
        }

        json
    }
}

impl<T, const D: usize> JsonType for Dynamic<T, D> {
    fn json_type() -> String {
        "dynamic".into()
    }
}

#[derive(Parser)]
#[command(name = "gen_rand_beam")]
#[command(about = "Write a random scene for run_beam_json")]
struct Args {
    /// Where to write the scene
    output: PathBuf,

    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u8).range(2..=3))]
    dim: u8,

    #[arg(long, default_value = "12")]
    mirrors: usize,

    #[arg(long, default_value = "4")]
    rays: usize,

    /// Seed of the generator, random if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of reflections per ray
    #[arg(long)]
    bounce: Option<usize>,

    /// Maximum distance travelled per ray
    #[arg(long)]
    far: Option<f64>,
}

fn generate<const D: usize>(
    config: &ReflectorConfig,
    num_mirrors: usize,
    num_rays: usize,
    rng: &mut (impl Rng + ?Sized),
) -> serde_json::Value {
    let mirrors = gen_rand_mirrors::<Dynamic<Box<dyn JsonSerDyn>, D>>(num_mirrors, rng);
    let rays: Vec<_> = iter::repeat_with(|| Ray::<D>::random(rng))
        .take(num_rays)
        .collect();

    beam_json::serialize_simulation(config, &Dynamic::<_, D>::untagged(mirrors), rays)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| beam_random::rand::thread_rng().gen());
    info!("seed: {seed}");
    let mut rng = StdRng::seed_from_u64(seed);

    let mut config = ReflectorConfig::default();
    if let Some(bounce) = args.bounce {
        config.params.bounce_limit = bounce;
    }
    if let Some(far) = args.far {
        anyhow::ensure!(far.is_finite() && far > 0.0, "far must be finite and positive, got {far}");
        config.params.far = far;
    }

    let json = match args.dim {
        2 => generate::<2>(&config, args.mirrors, args.rays, &mut rng),
        _ => generate::<3>(&config, args.mirrors, args.rays, &mut rng),
    };

    let file = File::create(&args.output)
        .with_context(|| format!("couldn't create {}", args.output.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &json)?;

    info!(
        "{} mirror(s) and {} ray(s) written to {}",
        args.mirrors,
        args.rays,
        args.output.display()
    );

    Ok(())
}
