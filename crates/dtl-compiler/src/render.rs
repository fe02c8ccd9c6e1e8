//! Rendering compile errors as annotated source snippets.

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use crate::CompileError;

/// Renders an error with its source context.
///
/// The span is widened to one byte when empty so the caret has something
/// to point at.
pub fn render_error(error: &CompileError, source: &str, path: &str, colored: bool) -> String {
    let renderer = if colored {
        Renderer::styled()
    } else {
        Renderer::plain()
    };

    let range = adjust_range(error, source.len());
    let snippet = Snippet::source(source).line_start(1).path(path).annotation(
        AnnotationKind::Primary
            .span(range)
            .label(&error.message),
    );

    let report = [Level::ERROR.primary_title(error.kind.title()).element(snippet)];
    renderer.render(&report).to_string()
}

fn adjust_range(error: &CompileError, limit: usize) -> std::ops::Range<usize> {
    let start = error.span.start as usize;
    let end = error.span.end as usize;

    if start == end {
        return start..(start + 1).min(limit);
    }
    start..end
}
