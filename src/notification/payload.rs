use std::collections::HashMap;

use crate::NotificationConfig;
use crate::NotificationPayload;
use crate::TemplateConfig;
use crate::TimerKind;
use crate::TimerRecord;
use crate::UserInfo;

const LABEL_PLACEHOLDER: &str = "{label}";
const KIND_PLACEHOLDER: &str = "{kind}";

/// Notification category shared by every timer reminder
pub const TIMER_CATEGORY: &str = "timer";

/// Renders reminder copy for timer records.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    templates: HashMap<TimerKind, TemplateConfig>,
    default_label: Option<String>,
}

impl PayloadBuilder {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut templates: HashMap<TimerKind, TemplateConfig> =
            TimerKind::ALL.into_iter().map(|kind| (kind, builtin_template(kind))).collect();

        for (name, template) in &config.templates {
            // Unknown names are rejected by NotificationConfig::validate
            if let Ok(kind) = name.parse::<TimerKind>() {
                templates.insert(kind, template.clone());
            }
        }

        let default_label = if config.default_label.trim().is_empty() {
            None
        } else {
            Some(config.default_label.clone())
        };

        Self {
            templates,
            default_label,
        }
    }

    pub fn build(
        &self,
        record: &TimerRecord,
    ) -> NotificationPayload {
        let kind = record.key.kind();
        let label = record
            .label
            .as_deref()
            .or(self.default_label.as_deref())
            .unwrap_or(record.key.owner_id());

        let template = self
            .templates
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| builtin_template(kind));

        NotificationPayload {
            id: record.key.to_string(),
            title: render(&template.title, label, kind),
            body: render(&template.body, label, kind),
            fire_at: record.end_time,
            category: TIMER_CATEGORY.to_string(),
            user_info: UserInfo {
                owner_id: record.key.owner_id().to_string(),
                kind,
            },
        }
    }
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new(&NotificationConfig::default())
    }
}

fn render(
    template: &str,
    label: &str,
    kind: TimerKind,
) -> String {
    template
        .replace(LABEL_PLACEHOLDER, label)
        .replace(KIND_PLACEHOLDER, kind.as_str())
}

fn builtin_template(kind: TimerKind) -> TemplateConfig {
    let (title, body) = match kind {
        TimerKind::Wash => ("Wash cycle done", "{label}'s laundry is washed. Time to move it to the dryer."),
        TimerKind::Dry => ("Drying done", "{label}'s laundry is dry and ready to fold."),
        TimerKind::Fold => ("Folding time is up", "Finish folding {label}'s laundry and put it away."),
        TimerKind::Recurrence => ("Laundry day", "It's time to start {label}'s next load."),
    };
    TemplateConfig {
        title: title.to_string(),
        body: body.to_string(),
    }
}
