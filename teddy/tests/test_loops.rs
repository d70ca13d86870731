use teddy::value::Value;
use teddy::{context, Environment};

use similar_asserts::assert_eq;

fn render(source: &str, ctx: Value) -> String {
    Environment::new().render_str(source, ctx).unwrap()
}

#[test]
fn test_simple_loop() {
    assert_eq!(
        render(
            r#"<loop through="letters" val="l"><p>{l}</p></loop>"#,
            context!(letters => vec!["a", "b", "c"])
        ),
        "<p>a</p><p>b</p><p>c</p>"
    );
}

#[test]
fn test_key_and_val() {
    let ctx = context!(letters => vec!["a", "b"], scores => context!(ann => 3, bob => 5));
    assert_eq!(
        render(r#"<loop through="letters" key="i" val="l">{i}:{l};</loop>"#, ctx.clone()),
        "0:a;1:b;"
    );
    assert_eq!(
        render(r#"<loop through="scores" key="name" val="n">{name}={n};</loop>"#, ctx.clone()),
        "ann=3;bob=5;"
    );
    assert_eq!(
        render(r#"<loop through="scores" key="name">{name};</loop>"#, ctx),
        "ann;bob;"
    );
}

#[test]
fn test_through_in_braces() {
    assert_eq!(
        render(
            r#"<loop through="{items}" val="x">[{x}]</loop>"#,
            context!(items => vec![1, 2])
        ),
        "[1][2]"
    );
}

#[test]
fn test_objects_in_loop() {
    let ctx = context!(users => vec![
        context!(name => "Ann", admin => true),
        context!(name => "Bob", admin => false),
    ]);
    assert_eq!(
        render(
            r#"<loop through="users" val="u"><li>{u.name}<if u.admin>*</if></li></loop>"#,
            ctx
        ),
        "<li>Ann*</li><li>Bob</li>"
    );
}

#[test]
fn test_nested_loops() {
    let ctx = context!(rows => vec![
        context!(cells => vec![1, 2]),
        context!(cells => vec![3]),
    ]);
    assert_eq!(
        render(
            r#"<loop through="rows" val="row"><loop through="row.cells" val="c">[{c}]</loop>|</loop>"#,
            ctx
        ),
        "[1][2]|[3]|"
    );
}

#[test]
fn test_relative_sources_across_three_levels() {
    let ctx = context!(sections => vec![
        context!(title => "A", rows => vec![
            context!(cells => vec![1, 2]),
            context!(cells => vec![3]),
        ]),
        context!(title => "B", rows => Vec::<i32>::new()),
    ]);
    assert_eq!(
        render(
            r#"<loop through="sections" val="s"><h2>{s.title}</h2><loop through="s.rows" val="r"><loop through="{r.cells}" val="c">{c}</loop>;</loop></loop>"#,
            ctx
        ),
        "<h2>A</h2>12;3;<h2>B</h2>"
    );
}

#[test]
fn test_nested_loop_isolation() {
    let ctx = context!(outer => vec![1, 2], inner => vec!["p", "q"]);
    assert_eq!(
        render(
            r#"<loop through="outer" val="x"><loop through="inner" val="x">{x}</loop>{x};</loop>"#,
            ctx
        ),
        "pq1;pq2;"
    );
}

#[test]
fn test_outer_variables_are_not_shadowed() {
    let ctx = context!(item => "outer", items => vec!["a", "b"]);
    assert_eq!(
        render(r#"{item}<loop through="items" val="item">{item}</loop>{item}"#, ctx),
        "outerabouter"
    );
}

#[test]
fn test_loop_sees_enclosing_model() {
    let ctx = context!(sep => "-", items => vec!["a", "b"]);
    assert_eq!(
        render(r#"<loop through="items" val="x">{x}{sep}</loop>"#, ctx),
        "a-b-"
    );
}

#[test]
fn test_unresolvable_sources_render_empty() {
    let ctx = context!(number => 42, items => vec![1]);
    assert_eq!(render(r#"a<loop through="missing" val="x">{x}</loop>b"#, ctx.clone()), "ab");
    assert_eq!(render(r#"a<loop through="number" val="x">{x}</loop>b"#, ctx.clone()), "ab");
    assert_eq!(render(r#"a<loop through="items">{x}</loop>b"#, ctx.clone()), "ab");
    assert_eq!(render(r#"a<loop val="x">{x}</loop>b"#, ctx), "ab");
}

#[test]
fn test_empty_sequence() {
    assert_eq!(
        render(
            r#"<ul><loop through="items" val="x"><li>{x}</li></loop></ul>"#,
            context!(items => Vec::<String>::new())
        ),
        "<ul></ul>"
    );
}

#[test]
fn test_loop_values_are_escaped() {
    assert_eq!(
        render(
            r#"<loop through="items" val="x">{x}|{x|s} </loop>"#,
            context!(items => vec!["<b>"])
        ),
        "&lt;b&gt;|<b> "
    );
}

#[test]
fn test_large_loop() {
    let items: Vec<usize> = (0..5000).collect();
    let rv = render(
        r#"<loop through="items" val="x"><p>{x}</p></loop><footer>done</footer>"#,
        context!(items),
    );
    assert!(rv.starts_with("<p>0</p><p>1</p>"));
    assert!(rv.ends_with("<p>4999</p><footer>done</footer>"));
}
