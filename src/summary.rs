use crate::tally::FrameTally;
use crate::values::ClassValueTable;
use crate::words::to_arabic_words;

/// Spoken when a money window closes without any tallied frame.
pub const NO_MONEY_TEXT: &str = "لا يوجد نقود";

const TOTAL_PREFIX: &str = "المجموع";
const CURRENCY: &str = "جنيه";
const THERE_IS: &str = "فيه";

/// Render the spoken summary for a representative tally.
///
/// States the total first, then one phrase per present class ordered by ascending
/// value: "فيه <count> <value>".
pub fn render_money_summary(tally: &FrameTally, table: &ClassValueTable) -> String {
    let total = tally.total_value(table);
    let mut text = format!(
        "{} {} {}.",
        TOTAL_PREFIX,
        to_arabic_words(saturating_u32(total)),
        CURRENCY
    );

    let mut present: Vec<(u32, u32)> = tally
        .counts()
        .iter()
        .filter_map(|(class, count)| table.value(*class).map(|value| (value, *count)))
        .collect();
    present.sort_by_key(|(value, _)| *value);

    for (value, count) in present {
        text.push(' ');
        text.push_str(&format!(
            "{} {} {}",
            THERE_IS,
            to_arabic_words(count),
            to_arabic_words(value)
        ));
    }
    text
}

fn saturating_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, Detection};

    fn det(class: usize) -> Detection {
        Detection::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0.9, class)
    }

    #[test]
    fn summary_states_total_then_ascending_denominations() {
        let table = ClassValueTable::default();
        // one 20, two 5s
        let tally = FrameTally::from_detections(&[det(2), det(0), det(0)], &table);
        let text = render_money_summary(&tally, &table);
        assert_eq!(
            text,
            "المجموع ثلاثون جنيه. فيه اثنان خمسة فيه واحد عشرون"
        );
    }

    #[test]
    fn summary_for_single_large_note() {
        let table = ClassValueTable::default();
        let tally = FrameTally::from_detections(&[det(5)], &table);
        assert_eq!(
            render_money_summary(&tally, &table),
            "المجموع مائتان جنيه. فيه واحد مائتان"
        );
    }
}
