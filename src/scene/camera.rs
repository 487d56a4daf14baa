use glam::{Mat4, Vec3};

/// World up used to derive the camera basis.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Pitch limit in degrees, keeps the basis away from the poles.
pub const MAX_PITCH: f32 = 89.0;

/// Field-of-view range in degrees reachable by zooming.
pub const FOV_RANGE: (f32, f32) = (1.0, 60.0);

/// Fly-through perspective camera driven by yaw and pitch.
///
/// `front`, `right` and `up` are derived from the angles and always form an
/// orthonormal basis after [`update_direction`](Self::update_direction).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Degrees around +Y, -90 looks down -Z.
    yaw: f32,
    /// Degrees, clamped to `[-MAX_PITCH, MAX_PITCH]`.
    pitch: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,

    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,

    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,

    view: Mat4,
    projection: Mat4,
}

impl Camera {
    /// A camera at `position` looking along `front`.
    #[must_use]
    pub fn new(position: Vec3, front: Vec3, aspect: f32) -> Self {
        let mut camera = Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            fov: 60.0,
            near: 0.1,
            far: 600.0,
            aspect,
            speed: 10.0,
            sensitivity: 0.1,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.look_along(front);
        camera.update_projection();
        camera
    }

    /// Points the camera along `direction`, deriving yaw and pitch from it.
    pub fn look_along(&mut self, direction: Vec3) {
        let dir = direction.normalize_or(Vec3::NEG_Z);
        let pitch = dir.y.clamp(-1.0, 1.0).asin().to_degrees();
        let yaw = dir.z.atan2(dir.x).to_degrees();
        self.set_orientation(yaw, pitch);
    }

    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.update_direction();
    }

    /// Recomputes `front`, `right`, `up` from yaw and pitch, then the view.
    pub fn update_direction(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.front.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.front).normalize();
        self.update_view();
    }

    pub fn update_view(&mut self) {
        self.view = Mat4::look_at_rh(self.position, self.position + self.front, self.up);
    }

    pub fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    /// Narrows or widens the field of view, clamped to [`FOV_RANGE`].
    pub fn zoom(&mut self, delta: f32) {
        self.fov = (self.fov - delta).clamp(FOV_RANGE.0, FOV_RANGE.1);
        self.update_projection();
    }

    #[must_use]
    pub fn front(&self) -> Vec3 {
        self.front
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.right
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    #[must_use]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// View matrix with the translation removed, for sky rendering.
    #[must_use]
    pub fn rotation_only_view(&self) -> Mat4 {
        let mut view = self.view;
        view.w_axis = glam::Vec4::W;
        view
    }

    /// The camera mirrored about the horizontal plane `y = water_height`.
    ///
    /// The position is reflected and the pitch negated; `front`, `right` and
    /// `up` are then rebuilt from the angles with the usual world up.
    #[must_use]
    pub fn reflected(&self, water_height: f32) -> Self {
        let mut mirror = self.clone();
        mirror.position.y = 2.0 * water_height - self.position.y;
        mirror.pitch = -self.pitch;
        mirror.update_direction();
        mirror
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(1.1, 10.5, 15.39), Vec3::new(-0.1, -0.36, -0.9), 800.0 / 600.0)
    }
}
