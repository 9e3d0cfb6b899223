use super::*;

use std::collections::HashMap;

/// Index of a material in [`Assets`]. Several nodes can share the same material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(usize);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Linear RGB
    pub color: [Float; 3],
    pub texture: Option<String>,
    pub emissive_intensity: Float,
    /// Animation speed of procedural materials
    pub speed: Float,
    pub metalness: Float,
    pub roughness: Float,
    pub opacity: Float,
    pub transparent: bool,
    pub blending: Blending,
    pub depth_write: bool,
    pub tone_mapped: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0; 3],
            texture: None,
            emissive_intensity: 0.0,
            speed: 0.0,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            transparent: false,
            blending: Blending::Normal,
            depth_write: true,
            tone_mapped: true,
        }
    }
}

impl Material {
    #[inline]
    pub fn textured(path: impl Into<String>) -> Self {
        Self {
            texture: Some(path.into()),
            ..Default::default()
        }
    }

    /// Additive, see-through and unaffected by tone mapping.
    pub fn glow(texture: impl Into<String>) -> Self {
        Self {
            texture: Some(texture.into()),
            transparent: true,
            blending: Blending::Additive,
            depth_write: false,
            tone_mapped: false,
            ..Default::default()
        }
    }
}

/// `0xRRGGBB` to linear RGB, without gamma correction.
pub fn rgb_hex(hex: u32) -> [Float; 3] {
    [16, 8, 0].map(|shift| ((hex >> shift) & 0xff) as Float / 255.0)
}

/// Materials shared between the nodes of a scene, addressed by [`MaterialId`] or by name.
#[derive(Clone, Debug, Default)]
pub struct Assets {
    materials: Vec<Material>,
    names: HashMap<String, MaterialId>,
}

impl Assets {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        material: Material,
    ) -> Result<MaterialId, SceneError> {
        let name = name.into();

        if self.names.contains_key(&name) {
            return Err(SceneError::DuplicateMaterial(name));
        }

        let id = MaterialId(self.materials.len());
        self.materials.push(material);
        self.names.insert(name, id);

        Ok(id)
    }

    /// # Panics
    ///
    /// if `id` doesn't come from this registry
    #[inline]
    pub fn get(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    /// Changes are seen by every node using this material.
    #[inline]
    pub fn get_mut(&mut self, id: MaterialId) -> &mut Material {
        &mut self.materials[id.0]
    }

    #[inline]
    pub fn find(&self, name: &str) -> Option<MaterialId> {
        self.names.get(name).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        let mut assets = Assets::new();
        assert!(assets.is_empty());

        let white = assets.add("white", Material::default()).unwrap();
        let dot = assets.add("dot", Material::glow("dot.png")).unwrap();

        assert_eq!(assets.len(), 2);
        assert_eq!(assets.find("dot"), Some(dot));
        assert_eq!(assets.get(dot).blending, Blending::Additive);
        assert!(!assets.get(dot).depth_write);

        assert_eq!(
            assets.add("white", Material::default()),
            Err(SceneError::DuplicateMaterial("white".into()))
        );

        assets.get_mut(white).emissive_intensity = 3.0;
        assert_eq!(assets.get(white).emissive_intensity, 3.0);
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(rgb_hex(0xff0000), [1.0, 0.0, 0.0]);
        assert_eq!(rgb_hex(0x888888), [136.0 / 255.0; 3]);
    }
}
