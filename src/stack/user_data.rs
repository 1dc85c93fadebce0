// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance bootstrap script
//!
//! Generates the user-data script that brings the session-management agent
//! up on first boot and records which stack launched the instance.

/// File the bootstrap script appends its log lines to
pub const INIT_LOG_PATH: &str = "/var/log/cloudformation-init.log";

/// Session-management agent package and service name
pub const SSM_AGENT: &str = "amazon-ssm-agent";

/// Ordered list of shell commands run once at first boot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapScript {
    commands: Vec<String>,
}

impl BootstrapScript {
    /// Empty Linux script (rendered with a bash shebang)
    pub fn for_linux() -> Self {
        Self::default()
    }

    pub fn add_commands<I, S>(&mut self, commands: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands.extend(commands.into_iter().map(Into::into));
        self
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Full script text
    pub fn render(&self) -> String {
        let mut script = String::from("#!/bin/bash");
        for command in &self.commands {
            script.push('\n');
            script.push_str(command);
        }
        script
    }
}

/// Escape a value for interpolation inside a double-quoted bash string.
fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '`' | '$') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Script installing and starting the SSM agent, then logging the stack,
/// project and environment the instance belongs to.
pub fn ssm_agent_bootstrap(stack_name: &str, project_tag: &str, environment_tag: &str) -> BootstrapScript {
    let stack_name = escape_double_quoted(stack_name);
    let project_tag = escape_double_quoted(project_tag);
    let environment_tag = escape_double_quoted(environment_tag);

    let mut script = BootstrapScript::for_linux();
    script.add_commands([
        "yum update -y".to_string(),
        format!("yum install -y {SSM_AGENT}"),
        format!("systemctl enable {SSM_AGENT}"),
        format!("systemctl start {SSM_AGENT}"),
        String::new(),
        "# Check SSM agent status".to_string(),
        format!("systemctl status {SSM_AGENT}"),
        String::new(),
        "# Record instance details".to_string(),
        format!(
            "echo \"$(date): Instance {stack_name} started successfully\" >> {INIT_LOG_PATH}"
        ),
        format!("echo \"Project: {project_tag}\" >> {INIT_LOG_PATH}"),
        format!("echo \"Environment: {environment_tag}\" >> {INIT_LOG_PATH}"),
    ]);
    script
}
