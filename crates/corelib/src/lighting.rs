//! Three-point lighting rig and Phong material state for the lit demo.
//! Explicit structs passed into the render step; no globals.

use crate::{Vec3, vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub enabled: bool,
}

/// Which light of the rig a toggle addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightRole {
    Key,
    Fill,
    Back,
}

/// Key/fill/back rig placed around an object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightRig {
    pub key: Light,
    pub fill: Light,
    pub back: Light,
}

impl LightRig {
    /// Classic three-point setup: bright key high to the front-right, soft
    /// cool fill from the left, dim rim light behind.
    pub fn three_point(object_position: Vec3, object_scale: f32) -> Self {
        Self {
            key: Light {
                position: object_position + vec3(2.0, 2.0, 2.0) * object_scale,
                color: vec3(1.0, 1.0, 1.0),
                intensity: 1.0,
                enabled: true,
            },
            fill: Light {
                position: object_position + vec3(-2.0, 1.0, 1.0) * object_scale,
                color: vec3(0.8, 0.8, 0.9),
                intensity: 0.5,
                enabled: true,
            },
            back: Light {
                position: object_position + vec3(0.0, 1.0, -2.0) * object_scale,
                color: vec3(0.7, 0.7, 1.0),
                intensity: 0.3,
                enabled: true,
            },
        }
    }

    pub fn light(&self, role: LightRole) -> &Light {
        match role {
            LightRole::Key => &self.key,
            LightRole::Fill => &self.fill,
            LightRole::Back => &self.back,
        }
    }

    /// Flip one light; returns the new enabled state so the caller can log.
    pub fn toggle(&mut self, role: LightRole) -> bool {
        let light = match role {
            LightRole::Key => &mut self.key,
            LightRole::Fill => &mut self.fill,
            LightRole::Back => &mut self.back,
        };
        light.enabled = !light.enabled;
        light.enabled
    }
}

/// Phong coefficients shared by the lit pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhongMaterial {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self {
            ambient: 0.1,
            diffuse: 0.7,
            specular: 0.5,
            shininess: 32.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rig_placement_scales_with_object() {
        let rig = LightRig::three_point(vec3(1.0, 0.0, 0.0), 2.0);
        assert_eq!(rig.key.position, vec3(5.0, 4.0, 4.0));
        assert_eq!(rig.fill.position, vec3(-3.0, 2.0, 2.0));
        assert_eq!(rig.back.position, vec3(1.0, 2.0, -4.0));
    }

    #[test]
    fn rig_intensities_follow_key_fill_back_ratio() {
        let rig = LightRig::three_point(Vec3::ZERO, 1.0);
        assert!(rig.key.intensity > rig.fill.intensity);
        assert!(rig.fill.intensity > rig.back.intensity);
    }

    #[test]
    fn toggle_flips_and_reports() {
        let mut rig = LightRig::three_point(Vec3::ZERO, 1.0);
        assert!(!rig.toggle(LightRole::Fill));
        assert!(!rig.light(LightRole::Fill).enabled);
        assert!(rig.toggle(LightRole::Fill));
        assert!(rig.light(LightRole::Key).enabled);
    }
}
