//! Root-URI resolution for a [`crate::types::TypedQuery`]'s context type.

use ov_core::context::ContextType;
use ov_core::identity::RequestContext;

/// Root URIs to search under for `context_type`, given an optional tenant
/// context. `memory` resolves to the union of the caller's user-memory and
/// agent-memory spaces; with no context (or `Root`, which has no single
/// space) it falls back to the generic, non-tenant preset paths.
pub fn root_uris(context_type: ContextType, ctx: Option<&RequestContext>) -> Vec<String> {
    let tenant = ctx.filter(|c| !c.is_root());
    match context_type {
        ContextType::Memory => match tenant {
            Some(rc) => vec![
                format!("viking://user/{}/memories", rc.user.user_space_name()),
                format!("viking://agent/{}/memories", rc.user.agent_space_name()),
            ],
            None => vec!["viking://user/memories".into(), "viking://agent/memories".into()],
        },
        ContextType::Resource => vec!["viking://resources".into()],
        ContextType::Skill => match tenant {
            Some(rc) => vec![format!("viking://agent/{}/skills", rc.user.agent_space_name())],
            None => vec!["viking://agent/skills".into()],
        },
        ContextType::Session => match tenant {
            Some(rc) => vec![format!("viking://session/{}", rc.user.agent_space_name())],
            None => vec!["viking://session".into()],
        },
    }
}
