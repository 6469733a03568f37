use photopilot_contracts::develop::ContextSnapshot;
use serde_json::Value;
use tracing::warn;

use crate::host::{DevelopHost, SettingsRecord};

/// Reads module, selection and the primary photo's white balance straight
/// from the host. Callers read this per request and per translation.
pub fn read_context<H: DevelopHost + ?Sized>(host: &H) -> ContextSnapshot {
    let module = host.active_module();
    let selected = host.selected_photos();
    let (temperature, tint) = match selected.first() {
        Some(primary) => match host.develop_settings(primary) {
            Ok(settings) => (
                numeric_setting(&settings, "Temperature"),
                numeric_setting(&settings, "Tint"),
            ),
            Err(err) => {
                warn!(photo = %primary, error = %format!("{err:#}"), "develop settings unreadable");
                (None, None)
            }
        },
        None => (None, None),
    };
    ContextSnapshot::new(module, selected.len(), temperature, tint)
}

fn numeric_setting(settings: &SettingsRecord, key: &str) -> Option<f64> {
    settings.get(key).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use photopilot_contracts::develop::WhiteBalanceMode;

    use super::read_context;
    use crate::test_support::FakeHost;

    #[test]
    fn context_follows_primary_photo() {
        let mut host = FakeHost::with_photos(&[("raw-1", 5200.0), ("jpg-1", 0.0)]);
        host.module = "Develop".to_string();

        let ctx = read_context(&host);
        assert_eq!(ctx.active_module, "Develop");
        assert_eq!(ctx.selected_count, 2);
        assert_eq!(ctx.white_balance, WhiteBalanceMode::Kelvin);
        assert_eq!(ctx.current_temperature, Some(5200.0));

        host.selection = vec!["jpg-1".to_string()];
        let ctx = read_context(&host);
        assert_eq!(ctx.selected_count, 1);
        assert_eq!(ctx.white_balance, WhiteBalanceMode::Slider);
    }

    #[test]
    fn empty_selection_has_no_white_balance() {
        let mut host = FakeHost::with_photos(&[("raw-1", 5200.0)]);
        host.selection.clear();
        let ctx = read_context(&host);
        assert_eq!(ctx.selected_count, 0);
        assert_eq!(ctx.current_temperature, None);
        assert_eq!(ctx.white_balance, WhiteBalanceMode::Slider);
    }
}
