//! Vendor power/health tokens mapped onto the ordinals the Zabbix templates
//! expect. Unrecognised tokens map to 0, so new firmware strings never fail a run.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PowerState {
    NotApplicable = 0,
    Off = 1,
    Offline = 2,
    On = 3,
    Online = 4,
    Standby = 5,
    Primary = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum HealthState {
    NotApplicable = 0,
    Failed = 1,
    NotOk = 2,
    Warning = 3,
    Ok = 4,
}

impl PowerState {
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl HealthState {
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

pub static POWER_STATES: &[(&str, PowerState)] = &[
    ("N/A", PowerState::NotApplicable),
    ("OFF", PowerState::Off),
    ("OFFLINE", PowerState::Offline),
    ("ON", PowerState::On),
    ("ONLINE", PowerState::Online),
    ("STANDBY", PowerState::Standby),
    ("PRIMARY", PowerState::Primary),
];

pub static HEALTH_STATES: &[(&str, HealthState)] = &[
    ("N/A", HealthState::NotApplicable),
    ("FAILED", HealthState::Failed),
    ("NOT OK", HealthState::NotOk),
    ("WARNING", HealthState::Warning),
    ("OK", HealthState::Ok),
];

#[derive(Debug, Clone, Copy)]
pub struct StateNormalizer {
    power: &'static [(&'static str, PowerState)],
    health: &'static [(&'static str, HealthState)],
}

impl StateNormalizer {
    pub fn new(
        power: &'static [(&'static str, PowerState)],
        health: &'static [(&'static str, HealthState)],
    ) -> Self {
        Self { power, health }
    }

    pub fn power_state(&self, token: &str) -> PowerState {
        lookup(self.power, token).unwrap_or(PowerState::NotApplicable)
    }

    pub fn health_state(&self, token: &str) -> HealthState {
        lookup(self.health, token).unwrap_or(HealthState::NotApplicable)
    }

    pub fn power_ordinal(&self, token: &str) -> u8 {
        self.power_state(token).ordinal()
    }

    pub fn health_ordinal(&self, token: &str) -> u8 {
        self.health_state(token).ordinal()
    }
}

impl Default for StateNormalizer {
    fn default() -> Self {
        Self::new(POWER_STATES, HEALTH_STATES)
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], token: &str) -> Option<T> {
    let token = token.trim();
    let found = table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(token))
        .map(|(_, state)| *state);

    if found.is_none() && !token.is_empty() {
        tracing::debug!(token, "Unrecognised state token, using 0");
    }
    found
}
