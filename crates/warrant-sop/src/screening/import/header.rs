/// Records scanned from the top of the export when looking for the header row.
pub(crate) const HEADER_SCAN_LIMIT: usize = 20;

const HEADER_MARKERS: [&str; 2] = ["代碼", "名稱"];
const GROUP_MARKERS: [&str; 2] = ["標的", "權證"];

/// First record whose joined cells mention both a code and a name column.
pub(crate) fn find_header_row(records: &[Vec<String>]) -> Option<usize> {
    records
        .iter()
        .take(HEADER_SCAN_LIMIT)
        .position(|record| {
            let joined = record.join(" ");
            HEADER_MARKERS.iter().all(|marker| joined.contains(marker))
        })
}

/// Header labels for the row at `header_index`, merging a group row above it if present.
///
/// Exports from some brokers split headers over two rows (`標的` over `代碼`). When the
/// record above the header holds a cell that is exactly a group marker, each label becomes
/// `upper + lower` unless the upper cell is blank or repeats the lower one.
pub(crate) fn merged_headers(records: &[Vec<String>], header_index: usize) -> Vec<String> {
    let lower = &records[header_index];
    let upper = header_index
        .checked_sub(1)
        .map(|index| &records[index])
        .filter(|record| {
            record
                .iter()
                .any(|cell| GROUP_MARKERS.contains(&cell.trim()))
        });

    let Some(upper) = upper else {
        return lower.iter().map(|cell| cell.trim().to_string()).collect();
    };

    lower
        .iter()
        .enumerate()
        .map(|(index, low)| {
            let low = low.trim();
            let up = upper.get(index).map(|cell| cell.trim()).unwrap_or("");
            if !up.is_empty() && up != low {
                format!("{up}{low}")
            } else {
                low.to_string()
            }
        })
        .collect()
}
