use indoc::indoc;

use crate::find_imports::find_imports;
use crate::parser::parse;

fn imports(source: &str) -> Vec<String> {
    let script = parse(source).unwrap();
    find_imports(&script)
        .into_iter()
        .map(|lit| lit.value.clone())
        .collect()
}

#[test]
fn imports_surface_in_source_order() {
    let source = indoc! {"
        x = IMPORT 'a';
        y = IMPORT 'b';
        z = IMPORT 'c';
    "};
    assert_eq!(imports(source), ["a", "b", "c"]);
}

#[test]
fn order_is_independent_of_later_references() {
    // Only a subset is referenced again; discovery still yields all three
    // in textual order.
    let source = indoc! {"
        x = IMPORT 'a';
        y = IMPORT 'b';
        z = IMPORT 'c';
        EXPORT y TO 'out';
    "};
    assert_eq!(imports(source), ["a", "b", "c"]);
}

#[test]
fn nested_imports_are_found() {
    let source = indoc! {"
        out = SELECT a FROM IMPORT 'base' JOIN IMPORT 'extra' ON a = b;
        EXPORT SELECT a FROM IMPORT 'tail' TO 'out';
    "};
    assert_eq!(imports(source), ["base", "extra", "tail"]);
}

#[test]
fn duplicate_paths_keep_their_first_position() {
    let source = indoc! {"
        x = IMPORT 'a';
        y = IMPORT 'b';
        z = IMPORT 'a';
    "};
    assert_eq!(imports(source), ["a", "b"]);
}
