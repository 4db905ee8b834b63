use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// An actuator at the crossing, each mirrored by one boolean cell in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Gate,
    Light,
    Buzzer,
}

impl Control {
    pub const ALL: [Control; 3] = [Control::Gate, Control::Light, Control::Buzzer];

    pub fn path(&self) -> &'static str {
        match self {
            Control::Gate => "servo/servo1",
            Control::Light => "led/led1",
            Control::Buzzer => "buzzer/buzzer1",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Control::Gate => "Gate Control",
            Control::Light => "Light Control",
            Control::Buzzer => "Buzzer Control",
        }
    }
}

impl Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Control::Gate => "gate",
            Control::Light => "light",
            Control::Buzzer => "buzzer",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Control {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gate" | "servo" => Ok(Control::Gate),
            "light" | "led" => Ok(Control::Light),
            "buzzer" => Ok(Control::Buzzer),
            other => Err(anyhow::anyhow!("unknown control {other:?}")),
        }
    }
}

/// Last known commanded state of every control. Last write wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub gate: bool,
    pub light: bool,
    pub buzzer: bool,
}

impl ControlState {
    pub fn get(&self, control: Control) -> bool {
        match control {
            Control::Gate => self.gate,
            Control::Light => self.light,
            Control::Buzzer => self.buzzer,
        }
    }

    pub fn set(&mut self, control: Control, on: bool) {
        match control {
            Control::Gate => self.gate = on,
            Control::Light => self.light = on,
            Control::Buzzer => self.buzzer = on,
        }
    }
}
