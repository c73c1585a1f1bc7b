//! Match resolution over the route tree
//!
//! Siblings are tried in declaration order. A route whose pattern matches a
//! prefix either completes the match (nothing left to consume) or hands the
//! rest to its children. When no child matches, that route is abandoned and
//! the next sibling is tried. Shells consume nothing and contribute a frame
//! in front of their children's frames.

use crate::match_list::{MatchFrame, PageKey, RouteFrame, ShellFrame, ShellKind};
use crate::matcher::concatenate_paths;
use crate::params::RouteParams;
use crate::route::{NavigatorKey, RouteBase};
use crate::trace_log;
use std::sync::Arc;

/// Frames and aggregated parameters of a successful match
#[derive(Debug, Clone)]
pub struct ResolvedFrames {
    pub frames: Vec<MatchFrame>,
    pub params: RouteParams,
}

/// Position in the tree reached by the ancestors of a node
struct Scope<'a> {
    matched_location: &'a str,
    full_path: &'a str,
    navigator_key: &'a NavigatorKey,
}

/// Resolve `path` against the top-level `routes`
pub fn resolve(routes: &[RouteBase], path: &str, root: &NavigatorKey) -> Option<ResolvedFrames> {
    let remaining: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let scope = Scope {
        matched_location: "",
        full_path: "",
        navigator_key: root,
    };
    match_routes(routes, &remaining, &scope)
}

fn match_routes(
    routes: &[RouteBase],
    remaining: &[&str],
    scope: &Scope<'_>,
) -> Option<ResolvedFrames> {
    routes
        .iter()
        .find_map(|route| match_route(route, remaining, scope))
}

fn match_route(route: &RouteBase, remaining: &[&str], scope: &Scope<'_>) -> Option<ResolvedFrames> {
    let navigator_key = route
        .parent_navigator_key()
        .unwrap_or(scope.navigator_key)
        .clone();

    match route {
        RouteBase::Route(leaf) => {
            let found = leaf.pattern().match_prefix(&remaining.join("/"))?;
            let segment = leaf.pattern().to_path(&found.params).ok()?;
            let matched_location = concatenate_paths(scope.matched_location, &segment);
            let full_path = concatenate_paths(scope.full_path, leaf.path());
            trace_log!("'{}' matched '{}'", full_path, matched_location);

            let frame = MatchFrame::Route(RouteFrame {
                route: Arc::clone(leaf),
                matched_location: matched_location.clone(),
                full_path: full_path.clone(),
                page_key: PageKey::new(full_path.clone()),
                navigator_key,
                params: found.params.clone(),
            });

            let rest = &remaining[found.consumed..];
            if rest.is_empty() {
                return Some(ResolvedFrames {
                    frames: vec![frame],
                    params: found.params,
                });
            }

            let child_scope = Scope {
                matched_location: &matched_location,
                full_path: &full_path,
                navigator_key: scope.navigator_key,
            };
            let child = match_routes(leaf.routes(), rest, &child_scope)?;

            let mut frames = Vec::with_capacity(child.frames.len() + 1);
            frames.push(frame);
            frames.extend(child.frames);
            let mut params = found.params;
            params.extend(&child.params);
            Some(ResolvedFrames { frames, params })
        }
        RouteBase::Shell(shell) => {
            let child_scope = Scope {
                matched_location: scope.matched_location,
                full_path: scope.full_path,
                navigator_key: shell.key(),
            };
            let child = match_routes(shell.routes(), remaining, &child_scope)?;
            Some(wrap(
                ShellFrame {
                    shell: ShellKind::Shell(Arc::clone(shell)),
                    matched_location: concatenate_paths(scope.matched_location, ""),
                    page_key: PageKey::new(format!("shell:{}", shell.key())),
                    navigator_key,
                    child_navigator_key: shell.key().clone(),
                },
                child,
            ))
        }
        RouteBase::StatefulShell(shell) => {
            shell
                .branches()
                .iter()
                .enumerate()
                .find_map(|(index, branch)| {
                    let child_scope = Scope {
                        matched_location: scope.matched_location,
                        full_path: scope.full_path,
                        navigator_key: branch.key(),
                    };
                    let child = match_routes(branch.routes(), remaining, &child_scope)?;
                    Some(wrap(
                        ShellFrame {
                            shell: ShellKind::Stateful {
                                route: Arc::clone(shell),
                                branch: index,
                            },
                            matched_location: concatenate_paths(scope.matched_location, ""),
                            page_key: PageKey::new(shell.shell_key()),
                            navigator_key: navigator_key.clone(),
                            child_navigator_key: branch.key().clone(),
                        },
                        child,
                    ))
                })
        }
    }
}

fn wrap(shell: ShellFrame, child: ResolvedFrames) -> ResolvedFrames {
    let mut frames = Vec::with_capacity(child.frames.len() + 1);
    frames.push(MatchFrame::Shell(shell));
    frames.extend(child.frames);
    ResolvedFrames {
        frames,
        params: child.params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Route, ShellRoute, StatefulShellBranch, StatefulShellRoute};
    use gpui::div;

    fn page(path: &str) -> Route {
        Route::new(path.to_string(), |_, _| div())
    }

    fn matched(resolved: &ResolvedFrames) -> Vec<String> {
        resolved
            .frames
            .iter()
            .map(|frame| match frame {
                MatchFrame::Route(frame) => frame.full_path.clone(),
                MatchFrame::Shell(frame) => format!("shell@{}", frame.child_navigator_key),
                MatchFrame::Imperative(_) => "imperative".to_string(),
            })
            .collect()
    }

    fn sample() -> Vec<RouteBase> {
        vec![
            page("/").into(),
            page("/a").child(page(":id")).into(),
        ]
    }

    #[test]
    fn test_resolve_nested_params() {
        let resolved = resolve(&sample(), "/a/42", &NavigatorKey::root()).unwrap();
        assert_eq!(matched(&resolved), vec!["/a", "/a/:id"]);
        assert_eq!(resolved.params.get("id"), Some("42"));
        assert_eq!(resolved.params.len(), 1);

        let MatchFrame::Route(leaf) = &resolved.frames[1] else {
            panic!("expected route frame");
        };
        assert_eq!(leaf.matched_location, "/a/42");
    }

    #[test]
    fn test_resolve_root_and_no_match() {
        let routes = sample();
        let root = NavigatorKey::root();

        let resolved = resolve(&routes, "/", &root).unwrap();
        assert_eq!(matched(&resolved), vec!["/"]);

        assert!(resolve(&routes, "/b", &root).is_none());
        assert!(resolve(&routes, "/a/1/2", &root).is_none());
    }

    #[test]
    fn test_sibling_fallback_after_child_failure() {
        let routes: Vec<RouteBase> = vec![
            page("/a").child(page("x")).into(),
            page("/a/:id").into(),
        ];
        let resolved = resolve(&routes, "/a/7", &NavigatorKey::root()).unwrap();
        assert_eq!(matched(&resolved), vec!["/a/:id"]);
    }

    #[test]
    fn test_first_sibling_wins() {
        let routes: Vec<RouteBase> = vec![page("/a/:id").into(), page("/a/new").into()];
        let resolved = resolve(&routes, "/a/new", &NavigatorKey::root()).unwrap();
        assert_eq!(matched(&resolved), vec!["/a/:id"]);
    }

    #[test]
    fn test_root_route_with_children() {
        let routes: Vec<RouteBase> = vec![page("/").child(page("settings")).into()];
        let resolved = resolve(&routes, "/settings", &NavigatorKey::root()).unwrap();
        assert_eq!(matched(&resolved), vec!["/", "/settings"]);
    }

    #[test]
    fn test_case_insensitive_literals() {
        let resolved = resolve(&sample(), "/A/Xy", &NavigatorKey::root()).unwrap();
        assert_eq!(resolved.params.get("id"), Some("Xy"));
    }

    #[test]
    fn test_shell_consumes_no_path() {
        let routes: Vec<RouteBase> = vec![ShellRoute::new(vec![
            page("/inbox").child(page(":mid")).into(),
        ])
        .navigator_key("mail")
        .into()];

        let resolved = resolve(&routes, "/inbox/9", &NavigatorKey::root()).unwrap();
        assert_eq!(matched(&resolved), vec!["shell@mail", "/inbox", "/inbox/:mid"]);

        let MatchFrame::Shell(shell) = &resolved.frames[0] else {
            panic!("expected shell frame");
        };
        assert_eq!(shell.navigator_key, NavigatorKey::root());
        let MatchFrame::Route(inbox) = &resolved.frames[1] else {
            panic!("expected route frame");
        };
        assert_eq!(inbox.navigator_key.as_str(), "mail");
    }

    #[test]
    fn test_parent_navigator_key_places_page() {
        let routes: Vec<RouteBase> = vec![ShellRoute::new(vec![page("/inbox")
            .child(page("compose").parent_navigator_key("root"))
            .into()])
        .navigator_key("mail")
        .into()];

        let resolved = resolve(&routes, "/inbox/compose", &NavigatorKey::root()).unwrap();
        let compose = resolved.frames[2].as_route().unwrap();
        assert_eq!(compose.navigator_key, NavigatorKey::root());
    }

    #[test]
    fn test_stateful_shell_selects_branch() {
        let routes: Vec<RouteBase> = vec![StatefulShellRoute::new(vec![
            StatefulShellBranch::new(vec![page("/a").into()]).navigator_key("a"),
            StatefulShellBranch::new(vec![page("/b").into()]).navigator_key("b"),
        ])
        .into()];

        let resolved = resolve(&routes, "/b", &NavigatorKey::root()).unwrap();
        assert_eq!(matched(&resolved), vec!["shell@b", "/b"]);
        let MatchFrame::Shell(ShellFrame {
            shell: ShellKind::Stateful { branch, .. },
            ..
        }) = &resolved.frames[0]
        else {
            panic!("expected stateful shell frame");
        };
        assert_eq!(*branch, 1);
    }
}
