//! The pretty print implementation of the [`ChipSet`] state, used by the hosts
//! to report a fault. It was split up into this file for smaller file sizes
//! and higher cohesion.

use std::fmt;

use once_cell::sync::Lazy;

use super::ChipSet;
use crate::{
    definitions::cpu,
    devices::{InputProvider, SoundDriver},
};

/// The amount of values shown on a single line, has to be bigger then 0
const HEX_PRINT_STEP: usize = 8;

const END_OF_LINE: char = '\n';
const INDENT_FILLAMENT: char = '\t';
const INDENT_SIZE: usize = 2;

/// The formatted string will be 2 symbols for the prefix (0x)
/// and 4 for the rest long.
macro_rules! intformat {
    () => {
        "{:#06X}"
    };
}

static POINTER_LEN: Lazy<usize> = Lazy::new(|| {
    let mut line = String::with_capacity(20);
    // writing into a string can not fail
    let _ = pointer_print::formatter(&mut line, 0, 0);
    line.len()
});

static INTEGER_LEN: Lazy<usize> = Lazy::new(|| {
    let mut line = String::new();
    let _ = integer_print::formatter(&mut line, 0u8);
    line.len()
});

/// A line length estimate, a bit bigger then the actual line will be.
static LENLINE: Lazy<usize> =
    Lazy::new(|| INDENT_SIZE + HEX_PRINT_STEP * (*INTEGER_LEN + 1) + 1 + *POINTER_LEN);

/// Will add an indent
fn indent_helper(text: &mut String, indent: usize) {
    for _ in 0..indent {
        text.push(INDENT_FILLAMENT);
    }
}

/// Removes the trailing line end.
fn trim_last_line(text: &mut String) {
    if let Some(index) = text.rfind(END_OF_LINE) {
        text.truncate(index);
    }
}

/// Handles all the printing of the pointer values.
mod pointer_print {
    use std::fmt::Write;

    /// will format the pointers according to definition
    pub(super) fn formatter(line: &mut String, from: usize, to: usize) -> std::fmt::Result {
        write!(line, concat!(intformat!(), " - ", intformat!(), " :"), from, to)
    }
}

/// Handles the printing of any and all unsigned integers.
mod integer_print {
    use super::{indent_helper, pointer_print, trim_last_line, END_OF_LINE, HEX_PRINT_STEP};
    use num_traits::Unsigned;
    use std::fmt::{self, Write};

    /// will format all integer types
    pub(super) fn formatter<T>(line: &mut String, data: T) -> fmt::Result
    where
        T: fmt::UpperHex + Unsigned + Copy,
    {
        write!(line, intformat!(), data)
    }

    /// will pretty print all the integer data given, the offsets are
    /// counted from the beginning of `data`
    pub(super) fn printer<T>(data: &[T], indent: usize) -> Result<String, fmt::Error>
    where
        T: fmt::UpperHex + Unsigned + Copy,
    {
        let mut res = String::with_capacity(*super::LENLINE * (data.len() / HEX_PRINT_STEP + 1));

        for (row, chunk) in data.chunks(HEX_PRINT_STEP).enumerate() {
            let from = row * HEX_PRINT_STEP;
            indent_helper(&mut res, indent);
            pointer_print::formatter(&mut res, from, from + chunk.len() - 1)?;

            for entry in chunk {
                res.push(' ');
                formatter(&mut res, *entry)?;
            }
            res.push(END_OF_LINE);
        }

        trim_last_line(&mut res);
        Ok(res)
    }
}

/// Handles the memory print, rows of opcodes where runs of zero rows
/// get folded into one.
mod opcode_print {
    use super::{indent_helper, integer_print, pointer_print, trim_last_line, END_OF_LINE, HEX_PRINT_STEP};
    use crate::{definitions::memory, opcode::Opcode};
    use once_cell::sync::Lazy;
    use std::fmt::{self, Write};

    /// The amount of bytes a single row covers
    const POINTER_INCREMENT: usize = HEX_PRINT_STEP * memory::opcodes::SIZE;
    /// The values that are used when there are at least two rows of zeros.
    const FILLER_BASE: &str = "...";

    /// Prepares the line that will be used for rows of only zeros.
    static ZERO_FILLER: Lazy<String> = Lazy::new(|| {
        let mut formatted = String::new();
        let _ = integer_print::formatter(&mut formatted, 0u16);
        match HEX_PRINT_STEP {
            1 => formatted,
            2 => format!("{} {}", formatted, formatted),
            _ => {
                let length = formatted.len() * (HEX_PRINT_STEP - 2) + (HEX_PRINT_STEP - 1)
                    - FILLER_BASE.len();
                let filler = " ".repeat(length / 2);
                format!("{}{}{}{}{}", formatted, filler, FILLER_BASE, filler, formatted)
            }
        }
    });

    /// this struct will simulate a single row of opcodes
    struct Row {
        from: usize,
        to: usize,
        data: Vec<Opcode>,
        only_null: bool,
    }

    impl fmt::Display for Row {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut res = String::with_capacity(*super::LENLINE);
            pointer_print::formatter(&mut res, self.from, self.to)?;

            if self.only_null {
                res.push(' ');
                res.push_str(&ZERO_FILLER);
            } else {
                for entry in self.data.iter() {
                    res.push(' ');
                    integer_print::formatter(&mut res, *entry)?;
                }
            }
            write!(f, "{}", res)
        }
    }

    /// will pretty print the content of the raw memory, the offsets are
    /// counted from the beginning of `memory`
    pub(super) fn printer(memory: &[u8], indent: usize) -> Result<String, fmt::Error> {
        let mut rows: Vec<Row> = Vec::with_capacity(memory.len() / POINTER_INCREMENT + 1);

        for (index, chunk) in memory.chunks(POINTER_INCREMENT).enumerate() {
            let from = index * POINTER_INCREMENT;
            let to = from + chunk.len() - 1;

            // an odd trailing byte is padded with zero
            let data: Vec<Opcode> = chunk
                .chunks(memory::opcodes::SIZE)
                .map(|pair| Opcode::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
                .collect();
            let only_null = data.iter().all(|opcode| *opcode == 0);

            let mut row = Row {
                from,
                to,
                data,
                only_null,
            };

            if only_null {
                if let Some(last_row) = rows.last() {
                    if last_row.only_null {
                        row.from = last_row.from;
                        rows.pop();
                    }
                }
            }
            rows.push(row)
        }

        let mut string = String::with_capacity((*super::LENLINE + 1) * rows.len());
        for row in rows {
            indent_helper(&mut string, indent);
            write!(string, "{}{}", row, END_OF_LINE)?;
        }
        trim_last_line(&mut string);
        Ok(string)
    }
}

impl<I, S> fmt::Display for ChipSet<I, S>
where
    I: InputProvider,
    S: SoundDriver,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let single = |value: usize| -> Result<String, fmt::Error> {
            let mut line = String::with_capacity(*INTEGER_LEN + INDENT_SIZE);
            indent_helper(&mut line, INDENT_SIZE);
            integer_print::formatter(&mut line, value)?;
            Ok(line)
        };

        let prc = single(self.program_counter)?;
        let idx = single(self.index_register)?;
        let del = single(self.delay_timer.get_value() as usize)?;
        let snd = single(self.sound_timer.get_value() as usize)?;

        let reg = integer_print::printer(&self.registers, INDENT_SIZE)?;

        // the stack is filled up with zeros to its full size
        let mut stack = [0usize; cpu::stack::SIZE];
        stack[..self.stack.len()].copy_from_slice(&self.stack);
        let sta = integer_print::printer(&stack, INDENT_SIZE)?;

        let mem = opcode_print::printer(&self.memory, INDENT_SIZE)?;

        write!(
            f,
            "Chipset {{\n\
                \tProgram Counter :\n{}\n\
                \tIndex Register :\n{}\n\
                \tDelay Timer :\n{}\n\
                \tSound Timer :\n{}\n\
                \tRegister :\n{}\n\
                \tStack :\n{}\n\
                \tMemory :\n{}\n\
                }}",
            prc, idx, del, snd, reg, sta, mem
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests;
    use crate::chip8::LoadRegion;

    const OUTPUT_PRINT: &str = "\
        Chipset {\n\
            \tProgram Counter :\n\
                \t\t0x0202\n\
            \tIndex Register :\n\
                \t\t0x0123\n\
            \tDelay Timer :\n\
                \t\t0x0007\n\
            \tSound Timer :\n\
                \t\t0x0000\n\
            \tRegister :\n\
                \t\t0x0000 - 0x0007 : 0x0005 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000\n\
                \t\t0x0008 - 0x000F : 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000\n\
            \tStack :\n\
                \t\t0x0000 - 0x0007 : 0x0ABC 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000\n\
                \t\t0x0008 - 0x000F : 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000\n\
            \tMemory :\n\
                \t\t0x0000 - 0x01FF : 0x0000                    ...                    0x0000\n\
                \t\t0x0200 - 0x020F : 0x6005 0x1200 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000\n\
                \t\t0x0210 - 0x0FFF : 0x0000                    ...                    0x0000\n\
        }";

    #[test]
    /// tests if the pretty print output is as expected
    fn test_full_print() {
        let mut chip = tests::get_default_chip();
        chip.load(&[0x60, 0x05, 0x12, 0x00], LoadRegion::Program)
            .expect("the program fits");
        chip.registers.fill(0);

        assert!(chip.step().is_ok());
        chip.index_register = 0x123;
        chip.delay_timer.set_value(7);
        chip.stack.push(0xABC);

        let actual_full = format!("{}", chip);
        let actual = actual_full.split('\n');
        let expected = OUTPUT_PRINT.split('\n');

        assert_eq!(actual_full.lines().count(), OUTPUT_PRINT.lines().count());
        for (exp, act) in expected.zip(actual) {
            assert_eq!(exp, act);
        }
    }

    #[test]
    fn test_lone_zero_row_is_folded_too() {
        let memory = [0u8; 16];
        let printed = super::opcode_print::printer(&memory, 0).expect("printing works");
        assert_eq!(
            printed,
            "0x0000 - 0x000F : 0x0000                    ...                    0x0000"
        );
    }
}
