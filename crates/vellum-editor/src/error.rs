use thiserror::Error;
use vellum_core::NodeId;

/// The only way a command can fail. Everything else a command can get wrong
/// (missing nodes, bad indices, declined boolean creation) is absorbed as a
/// no-op and reported on the `debug` log channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl CommandError {
    pub(crate) fn root_deletion(id: NodeId) -> Self {
        CommandError::InvariantViolation(format!("cannot delete root node `{id}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_node() {
        let err = CommandError::root_deletion(NodeId::intern("root"));
        assert_eq!(err.to_string(), "invariant violation: cannot delete root node `root`");
    }
}
