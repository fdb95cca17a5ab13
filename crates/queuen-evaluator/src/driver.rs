use crate::builder::{build, BuildError};
use crate::queue::Queue;
use queuen_parser::{ParseElement, TreeKind};
use std::io::{self, Write};
use thiserror::Error;

/// Default number of elements a print mode will pull at any level before
/// concluding a stream is infinite.
pub const DEFAULT_PROBE_BUDGET: usize = 1024;

/// An error raised while executing a statement.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A queue with the laziness boiled away: finite nested sequences.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listed(pub Vec<Listed>);

/// Drives queues through a bounded probe and prints them.
///
/// Every pull, at every nesting level, runs through a [`Queue::Take`]
/// wrapper with this driver's budget, so each print mode terminates even
/// when the queue graph holds a factory somewhere. Truncation at any level
/// is reported after the output.
#[derive(Debug, Clone, Copy)]
pub struct Driver {
    budget: usize,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    pub fn new() -> Self {
        Self {
            budget: DEFAULT_PROBE_BUDGET,
        }
    }

    /// Configure the probe budget to use while printing.
    pub fn probe_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    /// Execute one parsed statement: output trees dispatch on their
    /// keyword, bare expressions print through [`Driver::smart_print`],
    /// assignments are parsed but not evaluated.
    pub fn run(&self, statement: &ParseElement, out: &mut dyn Write) -> Result<(), EvalError> {
        if let ParseElement::Tree(tree) = statement {
            match tree.kind() {
                TreeKind::Output => {
                    let [keyword, argument] = tree.children() else {
                        return Err(BuildError::NotImplemented("output".into()).into());
                    };
                    let ParseElement::Token(keyword) = keyword else {
                        return Err(BuildError::NotImplemented("output".into()).into());
                    };
                    let queue = build(argument)?;
                    return match keyword.text() {
                        "print" => self.smart_print(queue, out),
                        "printNum" => self.print_num(queue, out),
                        "printStr" => self.print_str(queue, out),
                        "printRepr" => self.print_repr(queue, out),
                        other => Err(BuildError::NotImplemented(other.to_string()).into()),
                    };
                }
                TreeKind::Assignment => {
                    return Err(BuildError::NotImplemented("assignment".into()).into());
                }
                _ => {}
            }
        }
        let queue = build(statement)?;
        self.smart_print(queue, out)
    }

    /// Emit the element count.
    pub fn print_num(&self, queue: Queue, out: &mut dyn Write) -> Result<(), EvalError> {
        let mut queue = Queue::take(queue, self.budget);
        let mut count = 0usize;
        while queue.next().is_some() {
            count += 1;
        }
        writeln!(out, "{count}")?;
        self.warn_if_truncated(queue.halted(), out)
    }

    /// Emit one character per element, its code point the element's
    /// length.
    pub fn print_str(&self, queue: Queue, out: &mut dyn Write) -> Result<(), EvalError> {
        let mut queue = Queue::take(queue, self.budget);
        let mut rendered = String::new();
        let mut truncated = false;
        while let Some(element) = queue.next() {
            let mut element = Queue::take(element, self.budget);
            let mut length = 0usize;
            while element.next().is_some() {
                length += 1;
            }
            truncated |= element.halted();
            push_char(&mut rendered, length);
        }
        truncated |= queue.halted();
        writeln!(out, "{rendered}")?;
        self.warn_if_truncated(truncated, out)
    }

    /// Emit the nested-bracket rendering of the whole queue.
    pub fn print_repr(&self, queue: Queue, out: &mut dyn Write) -> Result<(), EvalError> {
        let (listed, truncated) = self.listify(queue);
        writeln!(out, "{}", stirfry(&listed))?;
        self.warn_if_truncated(truncated, out)
    }

    /// Choose a rendering from the shape of the data: the count when every
    /// element is empty, a character string when every element is a
    /// non-empty flat run of empties, the repr otherwise.
    pub fn smart_print(&self, queue: Queue, out: &mut dyn Write) -> Result<(), EvalError> {
        let (listed, truncated) = self.listify(queue);
        let Listed(items) = &listed;
        if items.iter().all(|Listed(inner)| inner.is_empty()) {
            writeln!(out, "{}", items.len())?;
        } else if items
            .iter()
            .all(|Listed(inner)| !inner.is_empty() && inner.iter().all(|Listed(e)| e.is_empty()))
        {
            let mut rendered = String::new();
            for Listed(inner) in items {
                push_char(&mut rendered, inner.len());
            }
            writeln!(out, "{rendered}")?;
        } else {
            writeln!(out, "{}", stirfry(&listed))?;
        }
        self.warn_if_truncated(truncated, out)
    }

    /// Boil a queue down to finite nested sequences, every level bounded
    /// by the probe budget. The flag reports truncation at any level.
    pub fn listify(&self, queue: Queue) -> (Listed, bool) {
        let mut queue = Queue::take(queue, self.budget);
        let mut truncated = false;
        let mut items = Vec::new();
        while let Some(element) = queue.next() {
            let (listed, t) = self.listify(element);
            truncated |= t;
            items.push(listed);
        }
        (Listed(items), truncated || queue.halted())
    }

    fn warn_if_truncated(&self, truncated: bool, out: &mut dyn Write) -> Result<(), EvalError> {
        if truncated {
            writeln!(out, "warning: output truncated after {} elements", self.budget)?;
        }
        Ok(())
    }
}

/// Code points below 28 render in caret notation (`^@` … `^[`); values
/// that are not valid characters render as U+FFFD.
fn push_char(rendered: &mut String, code: usize) {
    if code < 28 {
        rendered.push('^');
        rendered.push((b'@' + code as u8) as char);
    } else {
        let c = u32::try_from(code).ok().and_then(char::from_u32);
        rendered.push(c.unwrap_or(char::REPLACEMENT_CHARACTER));
    }
}

/// `ε` for the empty sequence, `[e₁, e₂, …]` otherwise.
pub fn stirfry(listed: &Listed) -> String {
    let Listed(items) = listed;
    if items.is_empty() {
        return "ε".to_string();
    }
    let rendered: Vec<String> = items.iter().map(stirfry).collect();
    format!("[{}]", rendered.join(", "))
}

#[cfg(test)]
mod test {
    use super::*;
    use expect_test::{expect, Expect};
    use queuen_parser::{parse_line, TokenStream};

    fn run_all(input: &str, budget: usize) -> String {
        let driver = Driver::new().probe_budget(budget);
        let mut stream = TokenStream::new(input);
        let mut out = Vec::new();
        while let Some(statement) = parse_line(&mut stream).expect("input should parse") {
            if let Err(error) = driver.run(&statement, &mut out) {
                writeln!(out, "error: {error}").unwrap();
            }
        }
        String::from_utf8(out).expect("driver output is UTF-8")
    }

    fn check(input: &str, expected: Expect) {
        expected.assert_eq(&run_all(input, DEFAULT_PROBE_BUDGET));
    }

    #[test]
    fn print_num_counts_elements() {
        check(
            "printNum [[],[],[]]",
            expect![[r#"
                3
            "#]],
        );
        check(
            "printNum 3",
            expect![[r#"
                3
            "#]],
        );
        check(
            "printNum 2 + 3",
            expect![[r#"
                5
            "#]],
        );
    }

    #[test]
    fn factory_elements_print_like_their_template() {
        let mut stream = TokenStream::new("$3");
        let statement = parse_line(&mut stream).unwrap().unwrap();
        let mut factory = build(&statement).unwrap();
        let driver = Driver::new();
        for _ in 0..3 {
            let element = factory.next().expect("factories never exhaust");
            let mut out = Vec::new();
            driver.print_num(element, &mut out).unwrap();
            assert_eq!(out, b"3\n");
        }
    }

    #[test]
    fn print_repr_renders_nested_brackets() {
        check(
            "printRepr [1,2,3] + [4,5,6]",
            expect![[r#"
                [[ε], [ε, ε], [ε, ε, ε], [ε, ε, ε, ε], [ε, ε, ε, ε, ε], [ε, ε, ε, ε, ε, ε]]
            "#]],
        );
        check(
            "printRepr []",
            expect![[r#"
                ε
            "#]],
        );
    }

    #[test]
    fn print_str_rounds_a_string_back() {
        check(
            "printStr \"AB\"",
            expect![[r#"
                AB
            "#]],
        );
    }

    #[test]
    fn print_str_renders_small_lengths_as_control_letters() {
        check(
            "printStr [2,3]",
            expect![[r#"
                ^B^C
            "#]],
        );
    }

    #[test]
    fn smart_print_counts_when_every_element_is_empty() {
        check(
            "2 + 3",
            expect![[r#"
                5
            "#]],
        );
        check(
            "[]",
            expect![[r#"
                0
            "#]],
        );
        check(
            "print 3",
            expect![[r#"
                3
            "#]],
        );
    }

    #[test]
    fn smart_print_strings_flat_runs() {
        check(
            "[2,3] ~ [5,7]",
            expect![[r#"
                ^G^J
            "#]],
        );
    }

    #[test]
    fn smart_print_falls_back_to_repr() {
        check(
            "[[3]]",
            expect![[r#"
                [[[ε, ε, ε]]]
            "#]],
        );
    }

    #[test]
    fn zipped_factories_probe_to_the_budget() {
        // Each element of $3 ~ $5 is Concat(Natural 3, Natural 5): length
        // 8, all of its own elements empty, an infinite supply of them.
        let output = run_all("print $3 ~ $5", 8);
        assert_eq!(
            output,
            "^H^H^H^H^H^H^H^H\nwarning: output truncated after 8 elements\n"
        );
    }

    #[test]
    fn truncation_is_reported() {
        let output = run_all("printNum $3", 8);
        assert_eq!(output, "8\nwarning: output truncated after 8 elements\n");
    }

    #[test]
    fn inner_truncation_is_reported_and_terminates() {
        let output = run_all("printRepr [$2]", 3);
        assert_eq!(
            output,
            "[[[ε, ε], [ε, ε], [ε, ε]]]\nwarning: output truncated after 3 elements\n"
        );
    }

    #[test]
    fn assignments_do_not_evaluate() {
        check(
            "x := 3",
            expect![[r#"
                error: not implemented: assignment
            "#]],
        );
    }

    #[test]
    fn statements_run_in_sequence() {
        check(
            "printNum 2\nprintNum [[],[]]\n",
            expect![[r#"
                2
                2
            "#]],
        );
    }

    #[test]
    fn stirfry_spells_empty_as_epsilon() {
        assert_eq!(stirfry(&Listed(vec![])), "ε");
        assert_eq!(
            stirfry(&Listed(vec![Listed(vec![]), Listed(vec![Listed(vec![])])])),
            "[ε, [ε]]"
        );
    }
}
