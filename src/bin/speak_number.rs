//! speak_number - print Egyptian Arabic words for numbers

use anyhow::Result;
use clap::Parser;

use youreyes::{decimal_to_arabic_words, to_arabic_words};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Numbers to render. Values with a fraction are spoken with "فاصلة".
    #[arg(required = true, allow_negative_numbers = true)]
    numbers: Vec<f32>,
    /// Append a unit word, e.g. "جنيه" or "سنتيمتر".
    #[arg(long)]
    unit: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    for value in args.numbers {
        let words = if value.fract() == 0.0 && value >= 0.0 && value <= u32::MAX as f32 {
            to_arabic_words(value as u32)
        } else {
            decimal_to_arabic_words(value)?
        };
        match &args.unit {
            Some(unit) => println!("{} {}", words, unit),
            None => println!("{}", words),
        }
    }
    Ok(())
}
