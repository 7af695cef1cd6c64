mod middleware_placement;
mod param_name_mismatch;
mod route_grouping;

pub use middleware_placement::MiddlewarePlacementRule;
pub use param_name_mismatch::ParamNameMismatchRule;
pub use route_grouping::RouteGroupingRule;

/// Builder methods that register a route handler on an application instance.
pub(crate) const ROUTE_METHODS: &[&str] = &[
    "all", "get", "post", "put", "patch", "delete", "options", "on",
];
