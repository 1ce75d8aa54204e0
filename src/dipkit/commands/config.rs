use crate::commands::{CmdMessage, CmdResult};
use crate::config::DipConfig;
use crate::error::Result;
use crate::links::LinkRewriter;
use crate::session::Session;
use crate::store::ExternalStore;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

/// Reads or updates the configuration stored in `project`'s root. A
/// successful `Set` also becomes the session's active configuration.
pub fn run<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    action: ConfigAction,
) -> Result<CmdResult> {
    let dir = {
        let tree = session.registry.get(project)?;
        tree.element(tree.root())?.resource.clone()
    };
    match action {
        ConfigAction::ShowAll => {
            let config = DipConfig::load(&session.store, &dir)?;
            Ok(CmdResult::default().with_config(config))
        }
        ConfigAction::ShowKey(key) => {
            let config = DipConfig::load(&session.store, &dir)?;
            let mut result = CmdResult::default();
            match config.get(&key) {
                Some(val) => result.add_message(CmdMessage::info(val)),
                None => {
                    result.add_message(CmdMessage::error(format!("Unknown config key: {}", key)))
                }
            }
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            let mut config = DipConfig::load(&session.store, &dir)?;
            if let Err(e) = config.set(&key, &value) {
                let mut res = CmdResult::default();
                res.add_message(CmdMessage::error(e.to_string()));
                return Ok(res);
            }
            config.save(&mut session.store, &dir)?;
            session.config = config.clone();
            let display_val = config.get(&key).unwrap_or_else(|| value.clone());
            let mut result = CmdResult::default().with_config(config);
            result.add_message(CmdMessage::success(format!("{} set to {}", key, display_val)));
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::config::ReservePolicy;
    use crate::test_utils::mem_session;

    #[test]
    fn test_set_persists_and_applies() {
        let mut session = mem_session();

        let result = run(
            &mut session,
            "proj",
            ConfigAction::Set("reserve-policy".into(), "before".into()),
        )
        .unwrap();

        assert_eq!(result.messages[0].level, MessageLevel::Success);
        assert_eq!(session.config.reserve_policy, ReservePolicy::Before);
        let shown = run(&mut session, "proj", ConfigAction::ShowKey("reserve-policy".into())).unwrap();
        assert_eq!(shown.messages[0].content, "before");
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let mut session = mem_session();

        let result = run(
            &mut session,
            "proj",
            ConfigAction::Set("file-step".into(), "abc".into()),
        )
        .unwrap();

        assert_eq!(result.messages[0].level, MessageLevel::Error);
        let all = run(&mut session, "proj", ConfigAction::ShowAll).unwrap();
        assert_eq!(all.config.unwrap().file_step, "010");
    }
}
