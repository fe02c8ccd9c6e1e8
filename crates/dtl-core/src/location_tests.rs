use crate::{LineIndex, Span};

#[test]
fn span_cover_takes_extremes() {
    let a = Span::new(3, 7);
    let b = Span::new(5, 12);

    assert_eq!(a.cover(b), Span::new(3, 12));
    assert_eq!(b.cover(a), Span::new(3, 12));
}

#[test]
fn offsets_resolve_to_one_based_positions() {
    let index = LineIndex::new("ab\ncd\n\nef");

    let start = index.location(0);
    assert_eq!((start.line, start.column), (1, 1));

    let second_line = index.location(3);
    assert_eq!((second_line.line, second_line.column), (2, 1));

    let mid = index.location(4);
    assert_eq!((mid.line, mid.column), (2, 2));

    let after_blank = index.location(7);
    assert_eq!((after_blank.line, after_blank.column), (4, 1));
}

#[test]
fn newline_belongs_to_its_line() {
    let index = LineIndex::new("a\nb");

    let newline = index.location(1);
    assert_eq!((newline.line, newline.column), (1, 2));

    let next = index.location(2);
    assert_eq!((next.line, next.column), (2, 1));
}

#[test]
fn empty_source_resolves() {
    let index = LineIndex::new("");
    let loc = index.location(0);
    assert_eq!((loc.line, loc.column), (1, 1));
}
