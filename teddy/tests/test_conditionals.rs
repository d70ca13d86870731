use teddy::value::Value;
use teddy::{context, Environment};

use similar_asserts::assert_eq;

fn render(source: &str, ctx: Value) -> String {
    Environment::new().render_str(source, ctx).unwrap()
}

fn choose(cond: &str, ctx: Value) -> String {
    render(&format!("<if {cond}>T</if><else>F</else>"), ctx)
}

#[test]
fn test_if_else() {
    let source = "<if something>A</if><else>B</else>";
    assert_eq!(render(source, context!(something => "Some content")), "A");
    assert_eq!(render(source, context!()), "B");
}

#[test]
fn test_truthiness() {
    let source = "<if x>yes</if><else>no</else>";
    assert_eq!(render(source, context!(x => true)), "yes");
    assert_eq!(render(source, context!(x => false)), "no");
    assert_eq!(render(source, context!(x => ())), "no");
    assert_eq!(render(source, context!(x => Vec::<i32>::new())), "no");
    assert_eq!(render(source, context!(x => context!())), "no");
    assert_eq!(render(source, context!(x => vec![1])), "yes");
    assert_eq!(render(source, context!(x => "")), "yes");
    assert_eq!(render(source, context!(x => 0)), "yes");
}

#[test]
fn test_and_truth_table() {
    for (a, b, expected) in [
        (false, false, "F"),
        (false, true, "F"),
        (true, false, "F"),
        (true, true, "T"),
    ] {
        assert_eq!(choose("a and b", context!(a, b)), expected, "{a} and {b}");
    }
}

#[test]
fn test_or_truth_table() {
    for (a, b, expected) in [
        (false, false, "F"),
        (false, true, "T"),
        (true, false, "T"),
        (true, true, "T"),
    ] {
        assert_eq!(choose("a or b", context!(a, b)), expected, "{a} or {b}");
    }
}

#[test]
fn test_xor_truth_table() {
    for (a, b, expected) in [
        (false, false, "F"),
        (false, true, "T"),
        (true, false, "T"),
        (true, true, "F"),
    ] {
        assert_eq!(choose("a xor b", context!(a, b)), expected, "{a} xor {b}");
    }
}

#[test]
fn test_literal_truth_table() {
    for (a, b, expected_and, expected_or) in [
        ("x", "y", "T", "T"),
        ("x", "n", "F", "T"),
        ("n", "y", "F", "T"),
        ("n", "n", "F", "F"),
    ] {
        let ctx = context!(a, b);
        assert_eq!(choose("a='x' and b='y'", ctx.clone()), expected_and);
        assert_eq!(choose(r#"a="x" or b="y""#, ctx), expected_or);
    }
}

#[test]
fn test_literal_comparisons() {
    assert_eq!(choose("n='5'", context!(n => 5)), "T");
    assert_eq!(choose("n='5'", context!(n => 6)), "F");
    assert_eq!(choose("flag='true'", context!(flag => true)), "T");
    assert_eq!(choose("missing=''", context!()), "F");
    assert_eq!(choose("empty=''", context!(empty => "")), "T");
}

#[test]
fn test_negation() {
    assert_eq!(choose("not:a", context!(a => false)), "T");
    assert_eq!(choose("not:a", context!(a => true)), "F");
    assert_eq!(choose("not a", context!(a => true)), "F");
    assert_eq!(choose("not:missing", context!()), "T");
    assert_eq!(choose("a and not:b", context!(a => true, b => false)), "T");
}

#[test]
fn test_operators_fold_left_to_right() {
    // (a or b) and c
    assert_eq!(
        choose("a or b and c", context!(a => true, b => false, c => false)),
        "F"
    );
    assert_eq!(
        choose("a or b and c", context!(a => false, b => true, c => true)),
        "T"
    );
    // implicit and
    assert_eq!(choose("a b", context!(a => true, b => false)), "F");
}

#[test]
fn test_sibling_chain() {
    let source = "<if a>1</if><elseif b>2</elseif><elseunless c>3</elseunless><else>4</else>";
    assert_eq!(render(source, context!(a => true)), "1");
    assert_eq!(render(source, context!(b => true)), "2");
    assert_eq!(render(source, context!(c => false)), "3");
    assert_eq!(render(source, context!(c => true)), "4");
}

#[test]
fn test_unless() {
    let source = "<unless logged_in>Sign in</unless><else>Welcome</else>";
    assert_eq!(render(source, context!()), "Sign in");
    assert_eq!(render(source, context!(logged_in => true)), "Welcome");
}

#[test]
fn test_siblings_separated_by_whitespace_and_comments() {
    let source = "<if a>1</if>\n  <!-- fallback -->\n  <else>2</else>|";
    assert_eq!(render(source, context!(a => true)), "1|");
    assert_eq!(render(source, context!()), "<!-- fallback -->2|");
}

#[test]
fn test_nested_conditionals() {
    let source = "<if a><if b>ab</if><else>a</else></if><else>none</else>";
    assert_eq!(render(source, context!(a => true, b => true)), "ab");
    assert_eq!(render(source, context!(a => true)), "a");
    assert_eq!(render(source, context!()), "none");
}

#[test]
fn test_empty_condition_is_false() {
    // a bare tag is not a directive, only the tags are dropped
    assert_eq!(render("x<if>kept</if>y", context!()), "xkepty");
    assert_eq!(render("<if >T</if><else>F</else>", context!()), "F");
}

#[test]
fn test_condition_on_nested_path() {
    let ctx = context!(user => context!(admin => true, name => "Ann"));
    assert_eq!(
        render("<if user.admin><b>{user.name}</b></if>", ctx),
        "<b>Ann</b>"
    );
}
