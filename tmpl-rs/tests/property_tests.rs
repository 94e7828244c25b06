use proptest::prelude::*;
use tmpl::template::{instantiate_str, Context, Directive, Error};

proptest! {
    /// The directive parser never panics; it returns Ok or Err.
    #[test]
    fn parser_does_not_panic(s in "\\PC*") {
        let _ = Directive::parse(&s);
    }
}

fn directive_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "\\PC{0,12}",
        Just("%if a".to_owned()),
        Just("%if v".to_owned()),
        Just("%if missing".to_owned()),
        Just("%endif".to_owned()),
        Just("%loop v i".to_owned()),
        Just("%loop e j".to_owned()),
        Just("%endloop".to_owned()),
        Just("%value a".to_owned()),
        Just("%value i".to_owned()),
        Just("%vector-length v".to_owned()),
        Just("%vector-value v i".to_owned()),
        Just("x %value a".to_owned()),
        Just("item %vector-value v i".to_owned()),
    ]
}

fn small_context() -> Context {
    let mut ctx = Context::new();
    ctx.add_variable("a", "1");
    ctx.add_vector("v");
    ctx.add_to_vector("v", "x");
    ctx.add_to_vector("v", "y");
    ctx.add_vector("e");
    ctx
}

proptest! {
    /// Instantiation never panics on arbitrary mixes of true and false
    /// conditions, empty and non-empty loops, and inline substitutions.
    /// Any failure is a syntax error pinned to a line of the template.
    #[test]
    fn instantiate_does_not_panic(lines in prop::collection::vec(directive_line(), 0..24)) {
        match instantiate_str(&small_context(), &lines.join("\n")) {
            Ok(_) => {}
            Err(Error::Syntax { line, .. }) => {
                prop_assert!(line >= 1 && line <= lines.len(), "line {} of {}", line, lines.len());
            }
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }
}

proptest! {
    /// Without the prefix anywhere, output equals input with every line
    /// terminated.
    #[test]
    fn literal_passthrough(lines in prop::collection::vec("[^%\r\n]{0,40}", 0..30)) {
        let template = lines.join("\n");
        let expected: String = template
            .split_inclusive('\n')
            .map(|l| format!("{}\n", l.strip_suffix('\n').unwrap_or(l)))
            .collect();
        let out = instantiate_str(&Context::new(), &template);
        prop_assert_eq!(out.ok(), Some(expected));
    }
}

proptest! {
    /// A loop over N elements emits its body N times with iterators 0..N.
    #[test]
    fn loop_iterates_once_per_element(values in prop::collection::vec("[a-z]{1,8}", 0..20)) {
        let mut ctx = Context::new();
        ctx.add_vector("v");
        for value in &values {
            ctx.add_to_vector("v", value.as_str());
        }
        let out = instantiate_str(&ctx, "%loop v i\n%value i\n%vector-value v i\n%endloop\n");

        let expected: String = values
            .iter()
            .enumerate()
            .map(|(i, value)| format!("{i}\n{value}\n"))
            .collect();
        prop_assert_eq!(out.ok(), Some(expected));
    }
}
