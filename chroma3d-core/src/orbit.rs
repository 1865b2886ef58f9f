/// Pointer-driven orbit controls with damping
///
/// The camera circles a fixed target on a sphere. Drag deltas are queued as
/// angular velocity and bled off by the damping factor each frame, which
/// gives rotation its inertia.
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::projection::Camera;

const POLAR_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitOptions {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    /// Spin while idle; zero disables it
    pub auto_rotate_speed: f32,
    /// Keep spinning after a model is loaded
    pub auto_rotate_when_loaded: bool,
}

impl Default for OrbitOptions {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.08,
            rotate_speed: 1.0,
            enable_zoom: false,
            enable_pan: false,
            min_distance: 0.5,
            max_distance: 6.0,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            auto_rotate_speed: 0.0,
            auto_rotate_when_loaded: false,
        }
    }
}

impl OrbitOptions {
    /// Horizon-locked turntable used for the showcase sculpture
    pub fn turntable() -> Self {
        Self {
            min_polar_angle: FRAC_PI_2,
            max_polar_angle: FRAC_PI_2,
            auto_rotate_speed: 1.3,
            auto_rotate_when_loaded: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub options: OrbitOptions,
    /// Whether auto-rotation currently applies
    pub auto_rotate: bool,
    theta_delta: f32,
    phi_delta: f32,
    zoom_scale: f32,
    pan_offset: Vector3<f32>,
    pointer: Option<(f32, f32)>,
}

impl OrbitControls {
    pub fn new(options: OrbitOptions) -> Self {
        Self {
            auto_rotate: options.auto_rotate_speed != 0.0,
            options,
            theta_delta: 0.0,
            phi_delta: 0.0,
            zoom_scale: 1.0,
            pan_offset: Vector3::zeros(),
            pointer: None,
        }
    }

    /// Called when a model mounts or unmounts
    pub fn set_model_loaded(&mut self, loaded: bool) {
        self.auto_rotate = self.options.auto_rotate_speed != 0.0
            && (!loaded || self.options.auto_rotate_when_loaded);
    }

    pub fn is_dragging(&self) -> bool {
        self.pointer.is_some()
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.pointer = Some((x, y));
    }

    /// Drag by screen pixels; a full viewport height turns one revolution
    pub fn pointer_move(&mut self, x: f32, y: f32, viewport_height: f32) {
        let Some((last_x, last_y)) = self.pointer else {
            return;
        };
        self.pointer = Some((x, y));
        let height = viewport_height.max(1.0);
        self.rotate(
            TAU * (x - last_x) / height * self.options.rotate_speed,
            TAU * (y - last_y) / height * self.options.rotate_speed,
        );
    }

    pub fn pointer_up(&mut self) {
        self.pointer = None;
    }

    /// Queue a rotation: `left` around the up axis, `up` toward the pole
    pub fn rotate(&mut self, left: f32, up: f32) {
        self.theta_delta -= left;
        self.phi_delta -= up;
    }

    /// Scale the orbit distance; ignored unless zoom is enabled
    pub fn zoom(&mut self, factor: f32) {
        if self.options.enable_zoom && factor > 0.0 {
            self.zoom_scale *= factor;
        }
    }

    /// Move the target in view space; ignored unless pan is enabled
    pub fn pan(&mut self, camera: &Camera, dx: f32, dy: f32) {
        if !self.options.enable_pan {
            return;
        }
        let forward = (camera.target - camera.position).normalize();
        let right = forward.cross(&camera.up).normalize();
        let up = right.cross(&forward);
        self.pan_offset += right * -dx + up * dy;
    }

    /// Advance one frame; returns whether the camera moved
    pub fn update(&mut self, camera: &mut Camera, dt: f32) -> bool {
        let offset = camera.position - camera.target;
        let mut radius = offset.norm();
        if radius <= f32::EPSILON {
            return false;
        }
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        if self.auto_rotate && self.pointer.is_none() {
            self.theta_delta -= TAU / 60.0 * self.options.auto_rotate_speed * dt;
        }

        if self.options.enable_damping {
            theta += self.theta_delta * self.options.damping_factor;
            phi += self.phi_delta * self.options.damping_factor;
        } else {
            theta += self.theta_delta;
            phi += self.phi_delta;
        }

        let min_phi = self.options.min_polar_angle.max(POLAR_EPSILON);
        let max_phi = self.options.max_polar_angle.min(PI - POLAR_EPSILON);
        phi = phi.clamp(min_phi, max_phi.max(min_phi));

        if self.options.enable_zoom {
            radius = (radius * self.zoom_scale)
                .clamp(self.options.min_distance, self.options.max_distance);
        }
        camera.target += self.pan_offset;

        let sin_phi = phi.sin();
        let new_offset = Vector3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        let before = camera.position;
        camera.position = Point3::from(camera.target.coords + new_offset);

        if self.options.enable_damping {
            self.theta_delta *= 1.0 - self.options.damping_factor;
            self.phi_delta *= 1.0 - self.options.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
        }
        self.zoom_scale = 1.0;
        self.pan_offset = Vector3::zeros();

        (camera.position - before).norm() > 1e-5
    }

    /// Drop any queued motion
    pub fn stop(&mut self) {
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.zoom_scale = 1.0;
        self.pan_offset = Vector3::zeros();
        self.pointer = None;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(OrbitOptions::default())
    }
}
