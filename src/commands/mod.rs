//! Bot commands.

mod channels;
mod clean;
mod posting;
mod random;
mod scan;
mod settings;
mod story;

use crate::{Data, GlipaError};

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, GlipaError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![
        story::story(),
        scan::scan(),
        random::random(),
        clean::clean(),
        settings::settings(),
        channels::channels(),
        posting::posting(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_are_unique() {
        let commands = list();
        let mut names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), commands.len());
    }

    #[test]
    fn admin_commands_require_permissions() {
        let admin_only = ["scan", "clean", "settings", "channels", "posting"];
        for command in list() {
            let needs_admin = command
                .required_permissions
                .contains(crate::serenity::Permissions::ADMINISTRATOR);
            assert_eq!(
                needs_admin,
                admin_only.contains(&command.name.as_str()),
                "{}",
                command.name
            );
        }
    }
}
