//! Plain-text rendering for the terminal. JSON output goes through serde.

use monnaie_analytics::{DatasetStats, RankingRow};
use monnaie_core::EnrichedTable;
use std::io::{self, Write};

const WEEKDAYS: [&str; 7] = ["Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi", "Dimanche"];

/// Writes rows as left-aligned columns separated by two spaces.
pub fn write_columns<W: Write>(out: &mut W, header: &[String], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    write_line(out, header, &widths)?;
    for row in rows {
        write_line(out, row, &widths)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        if i + 1 < cells.len() {
            let pad = widths[i].saturating_sub(cell.chars().count());
            line.extend(std::iter::repeat(' ').take(pad));
        }
    }
    writeln!(out, "{}", line.trim_end())
}

pub fn write_table<W: Write>(out: &mut W, table: &EnrichedTable) -> io::Result<()> {
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = row.cells.iter().map(ToString::to_string).collect();
            cells.push(row.sender_kind.to_string());
            cells.push(row.recipient_kind.to_string());
            cells
        })
        .collect();
    write_columns(out, &table.grid_header(), &rows)
}

pub fn write_ranking<W: Write>(out: &mut W, ranking: &[RankingRow]) -> io::Result<()> {
    let header: Vec<String> = [
        "Professionnel",
        "B2B Reçu",
        "B2B Emis",
        "Rémunération",
        "Reconversion",
        "Total Reçu",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let rows: Vec<Vec<String>> = ranking
        .iter()
        .map(|r| {
            vec![
                r.account.clone(),
                r.b2b_received.to_string(),
                r.b2b_emitted.to_string(),
                r.remuneration.to_string(),
                r.reconversion.to_string(),
                r.total_received.to_string(),
            ]
        })
        .collect();
    write_columns(out, &header, &rows)
}

pub fn write_stats<W: Write>(out: &mut W, stats: &DatasetStats) -> io::Result<()> {
    writeln!(out, "Transactions par jour")?;
    for (date, count) in &stats.daily_counts {
        writeln!(out, "  {date}  {count}")?;
    }

    writeln!(out, "\nMontant moyen par semaine")?;
    for (week, average) in &stats.weekly_average {
        writeln!(out, "  {week}  {average}")?;
    }

    writeln!(out, "\nTransactions par heure")?;
    for (hour, count) in stats.hourly_counts.iter().enumerate() {
        if *count > 0 {
            writeln!(out, "  {hour:02}h  {count}")?;
        }
    }

    writeln!(out, "\nTransactions par jour de la semaine")?;
    for (name, count) in WEEKDAYS.iter().zip(stats.weekday_counts) {
        writeln!(out, "  {name:<9} {count}")?;
    }

    writeln!(out, "\nVolume cumulé")?;
    if let Some(last) = stats.cumulative_volume.last() {
        writeln!(out, "  {}  {}", last.date, last.total)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn columns_are_padded_by_char_count() {
        let header = vec!["Nom".to_string(), "Total".to_string()];
        let rows = vec![vec!["Épicerie".to_string(), "12".to_string()]];
        let text = render(|out| write_columns(out, &header, &rows));
        assert_eq!(text, "Nom       Total\nÉpicerie  12\n");
    }

    #[test]
    fn ranking_has_display_header() {
        let ranking = vec![RankingRow {
            account: "Shop".into(),
            b2b_received: 5,
            b2b_emitted: 0,
            remuneration: 0,
            reconversion: 1,
            total_received: 6,
        }];
        let text = render(|out| write_ranking(out, &ranking));
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Professionnel  B2B Reçu"));
        assert!(lines.next().unwrap().ends_with("6"));
    }

    #[test]
    fn empty_stats_list_every_weekday() {
        let text = render(|out| write_stats(out, &DatasetStats::default()));
        assert!(text.contains("Dimanche  0"));
        assert!(!text.contains("00h"));
    }
}
