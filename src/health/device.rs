//! Station component status from the device-health flags of a reading

use serde::Serialize;

use crate::readings::Reading;

/// Monitored station components, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Aht20,
    Rtc,
    Pms7003,
    Wifi,
    Ntp,
    Sdcard,
    Thingspeak,
}

impl Component {
    pub fn all() -> &'static [Component] {
        &[
            Component::Aht20,
            Component::Rtc,
            Component::Pms7003,
            Component::Wifi,
            Component::Ntp,
            Component::Sdcard,
            Component::Thingspeak,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Component::Aht20 => "AHT20",
            Component::Rtc => "RTC",
            Component::Pms7003 => "PMS7003",
            Component::Wifi => "WiFi",
            Component::Ntp => "NTP",
            Component::Sdcard => "SD Card",
            Component::Thingspeak => "Thingspeak",
        }
    }

    /// Field name used on the wire
    pub fn key(&self) -> &'static str {
        match self {
            Component::Aht20 => "aht20",
            Component::Rtc => "rtc",
            Component::Pms7003 => "pms7003",
            Component::Wifi => "wifi",
            Component::Ntp => "ntp",
            Component::Sdcard => "sdcard",
            Component::Thingspeak => "thingspeak",
        }
    }

    pub fn flag(&self, reading: &Reading) -> Option<bool> {
        match self {
            Component::Aht20 => reading.aht20,
            Component::Rtc => reading.rtc,
            Component::Pms7003 => reading.pms7003,
            Component::Wifi => reading.wifi,
            Component::Ntp => reading.ntp,
            Component::Sdcard => reading.sdcard,
            Component::Thingspeak => reading.thingspeak,
        }
    }
}

/// One row of the device status monitor
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComponentStatus {
    pub component: Component,
    pub label: &'static str,
    /// `None` when the reading did not report this flag
    pub online: Option<bool>,
}

impl ComponentStatus {
    pub fn state_label(&self) -> &'static str {
        match self.online {
            Some(true) => "ON",
            Some(false) => "OFF",
            None => "--",
        }
    }
}

/// Status of every component as reported by `reading`
pub fn device_status(reading: &Reading) -> Vec<ComponentStatus> {
    Component::all()
        .iter()
        .map(|&component| ComponentStatus {
            component,
            label: component.label(),
            online: component.flag(reading),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_order_and_values() {
        let reading = Reading {
            wifi: Some(true),
            sdcard: Some(false),
            ..Reading::at(1)
        };
        let status = device_status(&reading);

        let labels: Vec<_> = status.iter().map(|s| s.label).collect();
        assert_eq!(
            labels,
            vec!["AHT20", "RTC", "PMS7003", "WiFi", "NTP", "SD Card", "Thingspeak"]
        );
        assert_eq!(status[3].state_label(), "ON");
        assert_eq!(status[5].state_label(), "OFF");
        assert_eq!(status[0].state_label(), "--");
    }
}
