//! `throw new Error("not found")` loses the status code; a typed HTTP
//! exception carries it.

use crate::ast::{Expr, Stmt};
use crate::rules::registry::{RuleDescriptor, META_HTTP_EXCEPTION};
use crate::rules::{create_finding, Context, Finding, Rule};

/// Canonical HTTP reason phrases (lowercased) and their status codes.
const HTTP_ERRORS: &[(&str, u16)] = &[
    ("bad request", 400),
    ("unauthorized", 401),
    ("payment required", 402),
    ("forbidden", 403),
    ("not found", 404),
    ("method not allowed", 405),
    ("not acceptable", 406),
    ("proxy authentication required", 407),
    ("request timeout", 408),
    ("conflict", 409),
    ("gone", 410),
    ("length required", 411),
    ("precondition failed", 412),
    ("payload too large", 413),
    ("uri too long", 414),
    ("unsupported media type", 415),
    ("range not satisfiable", 416),
    ("expectation failed", 417),
    ("im_a_teapot", 418),
    ("misdirected request", 421),
    ("unprocessable entity", 422),
    ("locked", 423),
    ("failed dependency", 424),
    ("too early", 425),
    ("upgrade required", 426),
    ("precondition required", 428),
    ("too many requests", 429),
    ("request header fields too large", 431),
    ("unavailable for legal reasons", 451),
    ("internal server error", 500),
    ("not implemented", 501),
    ("bad gateway", 502),
    ("service unavailable", 503),
    ("gateway timeout", 504),
    ("http version not supported", 505),
    ("variant also negotiates", 506),
    ("insufficient storage", 507),
    ("loop detected", 508),
    ("not extended", 510),
    ("network authentication required", 511),
];

fn status_for(message: &str) -> Option<u16> {
    let lower = message.to_lowercase();
    HTTP_ERRORS
        .iter()
        .find(|(phrase, _)| *phrase == lower)
        .map(|(_, status)| *status)
}

/// Rule suggesting a typed HTTP exception over a generic `Error`.
pub struct HttpExceptionRule;

impl HttpExceptionRule {
    /// Creates a fresh rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for HttpExceptionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for HttpExceptionRule {
    fn name(&self) -> &'static str {
        "HttpExceptionRule"
    }

    fn descriptor(&self) -> &'static RuleDescriptor {
        &META_HTTP_EXCEPTION
    }

    fn enter_stmt(&mut self, stmt: &Stmt, context: &Context) -> Option<Vec<Finding>> {
        let Stmt::Throw { argument, .. } = stmt else {
            return None;
        };
        let Expr::New {
            callee,
            arguments,
            span,
        } = argument
        else {
            return None;
        };
        if callee.as_identifier() != Some("Error") || arguments.len() != 1 {
            return None;
        }
        let message = arguments.first().and_then(Expr::as_string)?;
        let status = status_for(message)?;
        Some(vec![create_finding(
            format!(
                "Prefer using HTTPException({status}, {{ message: \"{message}\" }}) instead of \
                 throwing a generic Error with HTTP status message."
            ),
            &META_HTTP_EXCEPTION,
            context,
            *span,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run_rule;

    fn check(source: &str) -> Vec<Finding> {
        run_rule(Box::new(HttpExceptionRule::new()), source)
    }

    #[test]
    fn generic_error_with_reason_phrase_reports() {
        let findings = check(
            "app.get('/a', (c) => {
                throw new Error('Not Found');
            });",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("HTTPException(404"));
        assert!(findings[0].message.contains("Not Found"));
    }

    #[test]
    fn casing_is_ignored_when_matching() {
        let findings = check("throw new Error('INTERNAL SERVER ERROR');");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("HTTPException(500"));
    }

    #[test]
    fn unrelated_error_messages_are_clean() {
        let findings = check("throw new Error('database connection lost');");
        assert!(findings.is_empty());
    }

    #[test]
    fn non_error_constructors_are_clean() {
        let findings = check("throw new HTTPException(404, { message: 'Not Found' });");
        assert!(findings.is_empty());
    }

    #[test]
    fn multiple_arguments_are_clean() {
        let findings = check("throw new Error('not found', { cause: err });");
        assert!(findings.is_empty());
    }

    #[test]
    fn rethrow_of_identifier_is_clean() {
        let findings = check("try { go(); } catch (e) { throw e; }");
        assert!(findings.is_empty());
    }
}
