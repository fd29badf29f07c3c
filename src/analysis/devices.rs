use crate::models::click::{ClickSample, DeviceClass};

/// Percentage of clicks from mobile devices, rounded to the nearest integer.
pub fn device_share(clicks: &[ClickSample]) -> u32 {
    if clicks.is_empty() {
        return 0;
    }
    let mobile = clicks
        .iter()
        .filter(|c| c.device_class == DeviceClass::Mobile)
        .count();
    ((mobile as f64 * 100.0) / clicks.len() as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn click(device_class: DeviceClass) -> ClickSample {
        ClickSample {
            occurred_at: Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap(),
            device_class,
            referrer: None,
            origin_ip: None,
        }
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(device_share(&[]), 0);
    }

    #[test]
    fn all_mobile_is_hundred() {
        let clicks = vec![click(DeviceClass::Mobile); 4];
        assert_eq!(device_share(&clicks), 100);
    }

    #[test]
    fn rounds_to_nearest_and_ignores_tablets() {
        let clicks = vec![
            click(DeviceClass::Mobile),
            click(DeviceClass::Tablet),
            click(DeviceClass::Desktop),
        ];
        assert_eq!(device_share(&clicks), 33);

        let clicks = vec![
            click(DeviceClass::Mobile),
            click(DeviceClass::Mobile),
            click(DeviceClass::Desktop),
        ];
        assert_eq!(device_share(&clicks), 67);
    }
}
