//! Scene environment: lighting, background, fog and the reference grid.
//!
//! The environment is a plain value type on the CPU side. The viewer diffs
//! the requested state against the current one and applies only the fields
//! that actually changed, so re-sending an identical state is a no-op.

use cgmath::Vector3;
use wgpu::util::DeviceExt;

/// Ambient light term, fixed by the viewer's look.
pub const AMBIENT_STRENGTH: f32 = 0.5;
/// Key light position in world space.
pub const LIGHT_POSITION: Vector3<f32> = Vector3::new(5.0, 5.0, 5.0);
/// Default key light intensity.
pub const DEFAULT_LIGHT_INTENSITY: f32 = 1.5;
/// Default background, a near-black studio grey.
pub const DEFAULT_BACKGROUND: [f32; 3] = [0x12 as f32 / 255.0; 3];

/// Exponential distance fog. `None` on the state means fog is disabled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogSettings {
    pub color: [f32; 3],
    pub density: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            color: DEFAULT_BACKGROUND,
            density: 0.05,
        }
    }
}

/// The full requested environment. Cheap to copy and compare.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvironmentState {
    pub light_intensity: f32,
    pub background: [f32; 3],
    pub fog: Option<FogSettings>,
    pub show_grid: bool,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self {
            light_intensity: DEFAULT_LIGHT_INTENSITY,
            background: DEFAULT_BACKGROUND,
            fog: None,
            show_grid: false,
        }
    }
}

/// Which parts of the environment changed between two states.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnvDelta {
    pub light: bool,
    pub background: bool,
    pub fog: bool,
    pub grid: bool,
}

impl EnvDelta {
    pub fn is_empty(&self) -> bool {
        *self == EnvDelta::default()
    }
}

impl EnvironmentState {
    /// Field-wise diff against `next`. Equal states produce an empty delta.
    pub fn diff(&self, next: &EnvironmentState) -> EnvDelta {
        EnvDelta {
            light: self.light_intensity != next.light_intensity,
            background: self.background != next.background,
            fog: self.fog != next.fog,
            grid: self.show_grid != next.show_grid,
        }
    }
}

/// Environment data in shader-ready form.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EnvUniform {
    light_position: [f32; 3],
    light_intensity: f32,
    light_color: [f32; 3],
    ambient_strength: f32,
    fog_color: [f32; 3],
    fog_density: f32,
}

impl EnvUniform {
    pub fn from_state(state: &EnvironmentState) -> Self {
        let (fog_color, fog_density) = match state.fog {
            Some(fog) => (fog.color, fog.density),
            None => (state.background, 0.0),
        };
        Self {
            light_position: LIGHT_POSITION.into(),
            light_intensity: state.light_intensity,
            light_color: [1.0, 1.0, 1.0],
            ambient_strength: AMBIENT_STRENGTH,
            fog_color,
            fog_density,
        }
    }
}

/// The environment uniform with its GPU resources, owned by the context.
#[derive(Debug)]
pub struct EnvResources {
    pub state: EnvironmentState,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl EnvResources {
    pub fn new(device: &wgpu::Device, state: EnvironmentState) -> Self {
        let uniform = EnvUniform::from_state(&state);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Environment Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("environment_bind_group_layout"),
            });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("environment_bind_group"),
        });

        Self {
            state,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Adopt the new state and rewrite the uniform buffer.
    pub fn apply(&mut self, queue: &wgpu::Queue, next: EnvironmentState) {
        self.state = next;
        let uniform = EnvUniform::from_state(&self.state);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

/// Convert a packed 0xRRGGBB color to linear-ish float RGB as used by the
/// clear color and fog.
pub fn rgb_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_states_diff_empty() {
        let a = EnvironmentState::default();
        let b = a;
        assert!(a.diff(&b).is_empty());
    }

    #[test]
    fn diff_flags_only_changed_fields() {
        let a = EnvironmentState::default();
        let mut b = a;
        b.light_intensity = 0.25;
        b.show_grid = true;

        let delta = a.diff(&b);
        assert!(delta.light);
        assert!(delta.grid);
        assert!(!delta.background);
        assert!(!delta.fog);
    }

    #[test]
    fn enabling_fog_is_a_fog_change() {
        let a = EnvironmentState::default();
        let mut b = a;
        b.fog = Some(FogSettings::default());
        assert!(a.diff(&b).fog);
        // and the same fog twice is not
        assert!(!b.diff(&b.clone()).fog);
    }

    #[test]
    fn hex_background_matches_default() {
        assert_eq!(rgb_from_hex(0x121212), DEFAULT_BACKGROUND);
    }

    #[test]
    fn fog_disabled_writes_zero_density() {
        let state = EnvironmentState::default();
        let uniform = EnvUniform::from_state(&state);
        assert_eq!(uniform.fog_density, 0.0);
    }
}
