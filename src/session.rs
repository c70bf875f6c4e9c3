//! Batch driver: reads events line by line, applies them to the book, and
//! writes the trade and snapshot wire lines.
//!
//! Output discipline: `output` carries only the deterministic protocol
//! (`M` trade lines as each submission finishes matching, then the `O`
//! snapshot lines and a terminating blank line at end of input).
//! Diagnostics for unknown cancels, duplicate ids, and malformed lines go
//! to the log, which the binary routes to stderr.

use crate::event::{self, Event};
use crate::order::book::Book;
use std::io::{BufRead, Write};
use tracing::{error, warn};

/// Consume `input` to end of stream, mutating `book` and writing the
/// output protocol to `output`. Each event runs to completion, including
/// every match and refill it triggers, before the next line is read.
pub fn run<R: BufRead, W: Write>(book: &mut Book, input: R, mut output: W) -> std::io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let event = match event::parse_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!("skipping malformed line {line:?}: {e}");
                continue;
            }
        };

        match event {
            Event::Submit(order) => match book.submit(order) {
                Ok(trades) => {
                    for trade in &trades {
                        writeln!(output, "{trade}")?;
                    }
                }
                Err(e) => error!("could not submit order: {e}"),
            },
            Event::Cancel(id) => {
                if let Err(e) = book.cancel(id) {
                    error!("could not cancel order: {e}");
                }
            }
        }
    }

    write_snapshot(book, &mut output)
}

/// Write one `O` line per resting order, buys before sells, followed by
/// the blank line that terminates the protocol.
pub fn write_snapshot<W: Write>(book: &Book, output: &mut W) -> std::io::Result<()> {
    for resting in book.snapshot() {
        writeln!(output, "{resting}")?;
    }
    writeln!(output)
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::order::book::Book;

    fn replay(input: &str) -> String {
        let mut book = Book::new();
        let mut out = Vec::new();
        run(&mut book, input.as_bytes(), &mut out).expect("session should not fail");
        String::from_utf8(out).expect("output should be UTF-8")
    }

    #[test]
    fn plain_cross_with_exact_fill() {
        let out = replay("L B 1 100 10\nL S 2 100 10\n");
        assert_eq!(out, "M 1 2 100 10\n\n");
    }

    #[test]
    fn partial_fill_rests_the_incoming_remainder() {
        let out = replay("L B 1 100 5\nL S 2 100 8\n");
        assert_eq!(out, "M 1 2 100 5\nO S 2 100 3\n\n");
    }

    #[test]
    fn price_tie_broken_by_time() {
        let out = replay("L B 1 100 5\nL B 2 100 5\nL S 3 100 7\n");
        assert_eq!(out, "M 1 3 100 5\nM 2 3 100 2\nO B 2 100 3\n\n");
    }

    #[test]
    fn large_taker_against_an_iceberg_aggregates() {
        let out = replay("I S 1 100 100 10\nL B 2 100 25\n");
        assert_eq!(out, "M 2 1 100 25\nO S 1 100 5\n\n");
    }

    #[test]
    fn refilled_iceberg_yields_the_head_to_a_plain_order() {
        let out = replay("I S 1 100 100 10\nL S 2 100 10\nL B 3 100 15\n");
        assert_eq!(
            out,
            "M 3 1 100 10\nM 3 2 100 5\nO S 2 100 5\nO S 1 100 10\n\n"
        );
    }

    #[test]
    fn unknown_cancel_leaves_only_the_terminator() {
        let out = replay("C 42\n");
        assert_eq!(out, "\n", "diagnostics must not reach the output stream");
    }

    #[test]
    fn unknown_cancel_does_not_stop_the_stream() {
        let out = replay("L B 1 100 5\nC 42\nL S 2 100 5\n");
        assert_eq!(out, "M 1 2 100 5\n\n");
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let out = replay("# warm-up\n\nL B 1 100 10 # resting bid\n   \n");
        assert_eq!(out, "O B 1 100 10\n\n");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let out = replay("HELLO\nL B 1 100 10\nL S\n");
        assert_eq!(out, "O B 1 100 10\n\n");
    }

    #[test]
    fn cancel_then_refill_scenario_replays_deterministically() {
        let input = "\
I S 1 100 60 10
L S 2 100 10
C 2
L B 3 100 15
";
        let out = replay(input);
        assert_eq!(
            out,
            "M 3 1 100 15\nO S 1 100 5\n\n",
            "after the cancel the iceberg supplies the whole fill"
        );
    }

    #[test]
    fn empty_input_produces_only_the_terminator() {
        assert_eq!(replay(""), "\n");
    }
}
