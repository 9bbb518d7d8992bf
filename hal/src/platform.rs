#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HardwareModel {
    #[default]
    Standalone,
    PrimeMk1,
    PrimeMk2,
    PrimeMk3,
    Skywatch,
    Dongle,
    Octave,
}

impl HardwareModel {
    /// Whether the sensor header is also routed to a second I2C controller.
    pub fn has_secondary_bus(self) -> bool {
        match self {
            Self::PrimeMk2 => true,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Platform {
    pub model: HardwareModel,
}

impl Platform {
    pub fn new(model: HardwareModel) -> Self {
        Self { model }
    }

    pub fn has_secondary_bus(&self) -> bool {
        self.model.has_secondary_bus()
    }
}
