//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.topics.inbound.trim().is_empty() {
        errors.push("topics.inbound must not be empty".to_string());
    }
    if config.topics.outbound.trim().is_empty() {
        errors.push("topics.outbound must not be empty".to_string());
    }
    if !config.topics.inbound.trim().is_empty() && config.topics.inbound == config.topics.outbound
    {
        errors.push("topics.inbound and topics.outbound must differ".to_string());
    }

    if let Some(name) = &config.joint.name {
        if name.trim().is_empty() {
            errors.push("joint.name must not be blank when set".to_string());
        }
    }

    let format = config.logging.format.to_ascii_lowercase();
    if format != "text" && format != "json" {
        errors.push(format!(
            "logging.format must be \"text\" or \"json\", got {:?}",
            config.logging.format
        ));
    }
    if config.logging.dir.trim().is_empty() {
        errors.push("logging.dir must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
