use super::color::Rgb;

/// Drawing instruction in CSS units (y grows downwards, angles clockwise).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Disc {
        cx: f64,
        cy: f64,
        radius: f64,
        color: Rgb,
    },
    Ring {
        cx: f64,
        cy: f64,
        radius: f64,
        width: f64,
        color: Rgb,
    },
    Sector {
        index: usize,
        cx: f64,
        cy: f64,
        inner_radius: f64,
        outer_radius: f64,
        start_angle: f64,
        end_angle: f64,
        fill: Rgb,
        stroke: Rgb,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        size: f64,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerMove,
    PointerLeave,
    Resize,
    ThemeChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Host drawing target for the radial chart.
pub trait Surface {
    /// Displayed size in CSS units.
    fn css_size(&self) -> (f64, f64);

    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    /// Resize the backing store; `scale` maps CSS units to backing pixels.
    fn set_backing_size(&mut self, width: u32, height: u32, scale: f64);

    fn draw(&mut self, command: DrawCommand);

    fn listen(&mut self, kind: ListenerKind) -> ListenerId;

    fn unlisten(&mut self, id: ListenerId);
}

/// In-memory surface that keeps the commands of the last frame. Adapters
/// rasterise from it; tests inspect it.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    css_size: (f64, f64),
    dpr: f64,
    backing: (u32, u32),
    scale: f64,
    commands: Vec<DrawCommand>,
    frames: usize,
    next_id: u64,
    listeners: Vec<(ListenerId, ListenerKind)>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            css_size: (width, height),
            dpr: 1.0,
            backing: (0, 0),
            scale: 1.0,
            commands: Vec::new(),
            frames: 0,
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn with_device_pixel_ratio(mut self, dpr: f64) -> Self {
        self.dpr = dpr;
        self
    }

    pub fn set_css_size(&mut self, width: f64, height: f64) {
        self.css_size = (width, height);
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        self.dpr = dpr;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of `Clear` commands seen, i.e. frames started.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.listeners.iter().any(|(_, k)| *k == kind)
    }
}

impl Surface for RecordingSurface {
    fn css_size(&self) -> (f64, f64) {
        self.css_size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    fn set_backing_size(&mut self, width: u32, height: u32, scale: f64) {
        self.backing = (width, height);
        self.scale = scale;
    }

    fn draw(&mut self, command: DrawCommand) {
        if command == DrawCommand::Clear {
            self.commands.clear();
            self.frames += 1;
        }
        self.commands.push(command);
    }

    fn listen(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, kind));
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }
}
