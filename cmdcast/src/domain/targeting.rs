//! Targeting filter: does a task apply to this node?

use super::{NodeIdentity, Task};

/// A task applies when both its id and role restrictions admit this node
pub fn applies(task: &Task, identity: &NodeIdentity) -> bool {
    id_matches(task, identity) && role_matches(task, identity)
}

/// True if the task has no id restriction or lists this node's id
pub fn id_matches(task: &Task, identity: &NodeIdentity) -> bool {
    task.target_server_ids.is_empty() || task.target_server_ids.iter().any(|id| id == identity.server_id())
}

/// True if the task has no role restriction or lists this node's role, ignoring case
pub fn role_matches(task: &Task, identity: &NodeIdentity) -> bool {
    if task.target_server_roles.is_empty() {
        return true;
    }
    let role = identity.server_role().to_lowercase();
    task.target_server_roles.iter().any(|r| r.to_lowercase() == role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node() -> NodeIdentity {
        NodeIdentity::new("10.0.0.5", "app")
    }

    #[test]
    fn test_untargeted_task_applies() {
        assert!(applies(&Task::new("t", vec![]), &node()));
    }

    #[test]
    fn test_id_restriction() {
        let task = Task::new("t", vec![]).with_server_ids(["10.0.0.5", "10.0.0.6"]);
        assert!(applies(&task, &node()));

        let task = Task::new("t", vec![]).with_server_ids(["10.0.0.6"]);
        assert!(!applies(&task, &node()));
    }

    #[test]
    fn test_id_comparison_is_exact() {
        let task = Task::new("t", vec![]).with_server_ids(["WEB-1"]);
        assert!(!applies(&task, &NodeIdentity::new("web-1", "app")));
    }

    #[test]
    fn test_role_comparison_ignores_case() {
        let task = Task::new("t", vec![]).with_server_roles(["APP"]);
        assert!(applies(&task, &node()));

        let task = Task::new("t", vec![]).with_server_roles(["app"]);
        assert!(applies(&task, &NodeIdentity::new("10.0.0.5", "App")));
    }

    #[test]
    fn test_role_mismatch() {
        let task = Task::new("t", vec![]).with_server_roles(["db", "cache"]);
        assert!(!applies(&task, &node()));
    }

    #[test]
    fn test_both_restrictions_must_hold() {
        let task = Task::new("t", vec![])
            .with_server_ids(["10.0.0.5"])
            .with_server_roles(["db"]);
        assert!(id_matches(&task, &node()));
        assert!(!role_matches(&task, &node()));
        assert!(!applies(&task, &node()));
    }

    proptest! {
        #[test]
        fn prop_empty_targets_always_apply(id in "\\PC*", role in "\\PC*") {
            let task = Task::new("t", vec![]);
            prop_assert!(applies(&task, &NodeIdentity::new(id, role)));
        }

        #[test]
        fn prop_foreign_ids_never_apply(
            id in "[a-z0-9.]{1,16}",
            others in proptest::collection::vec("[A-Z]{1,8}", 1..5),
            role in "[a-z]{1,8}",
        ) {
            // Uppercase-only ids can never equal a lowercase node id
            let task = Task::new("t", vec![])
                .with_server_ids(others)
                .with_server_roles([role.clone()]);
            prop_assert!(!applies(&task, &NodeIdentity::new(id, role)));
        }

        #[test]
        fn prop_role_match_ignores_case(role in "[a-zA-Z]{1,12}") {
            let task = Task::new("t", vec![]).with_server_roles([role.to_uppercase()]);
            prop_assert!(applies(&task, &NodeIdentity::new("n", role.to_lowercase())));
        }
    }
}
