use glam::Vec2;

/// Offset of the world layer relative to a viewport anchored at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Camera {
    offset: Vec2,
    viewport: Vec2,
    moved: bool,
}

impl Camera {
    pub(crate) const fn new(viewport: Vec2) -> Self {
        Self {
            offset: Vec2::ZERO,
            viewport,
            moved: false,
        }
    }

    pub(crate) const fn offset(&self) -> Vec2 {
        self.offset
    }

    pub(crate) const fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub(crate) const fn moved(&self) -> bool {
        self.moved
    }

    pub(crate) fn clear_moved(&mut self) {
        self.moved = false;
    }

    pub(crate) fn resize(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        self.moved = true;
    }

    pub(crate) fn screen_position(&self, world: Vec2) -> Vec2 {
        world + self.offset
    }

    pub(crate) fn center_on(&mut self, position: Vec2) {
        self.offset = self.viewport * 0.5 - position;
        self.moved = true;
    }

    /// Shifts the camera along each axis so `position` stays at least
    /// `margin` away from every viewport edge. Returns whether it moved.
    pub(crate) fn follow(&mut self, position: Vec2, margin: f32) -> bool {
        let screen = self.screen_position(position);
        let before = self.offset;
        self.offset.x += axis_correction(screen.x, self.viewport.x, margin);
        self.offset.y += axis_correction(screen.y, self.viewport.y, margin);

        let shifted = self.offset != before;
        self.moved |= shifted;
        shifted
    }
}

fn axis_correction(coordinate: f32, extent: f32, margin: f32) -> f32 {
    if coordinate < margin {
        margin - coordinate
    } else if coordinate > extent - margin {
        extent - margin - coordinate
    } else {
        0.0
    }
}
