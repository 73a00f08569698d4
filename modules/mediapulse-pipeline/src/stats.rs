use crate::intake::IntakeStats;

/// Stats from one or more processed days.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunStats {
    pub dates_processed: u32,
    pub dates_skipped: u32,
    pub rows_received: u32,
    pub rows_blocked: u32,
    pub rows_duplicate: u32,
    pub rows_over_cap: u32,
    pub rows_classified: u32,
    pub resolved_exact: u32,
    pub resolved_fallback: u32,
    pub unresolved: u32,
    pub by_sentiment: [u32; 3], // Positive, Neutral, Negative
    pub controlled: u32,
    pub edits_applied: u32,
    pub aggregates_written: u32,
    pub index_rows_pruned: u32,
    pub editable_matched: u32,
    pub editable_edits_preserved: u32,
    pub editable_orphans_kept: u32,
    pub alerts_due: u32,
}

impl RunStats {
    pub fn record_intake(&mut self, intake: &IntakeStats) {
        self.rows_received += intake.received as u32;
        self.rows_blocked += intake.blocked as u32;
        self.rows_duplicate += intake.duplicates as u32;
        self.rows_over_cap += intake.over_cap as u32;
    }

    /// Fold another day's stats into this one.
    pub fn absorb(&mut self, other: &RunStats) {
        self.dates_processed += other.dates_processed;
        self.dates_skipped += other.dates_skipped;
        self.rows_received += other.rows_received;
        self.rows_blocked += other.rows_blocked;
        self.rows_duplicate += other.rows_duplicate;
        self.rows_over_cap += other.rows_over_cap;
        self.rows_classified += other.rows_classified;
        self.resolved_exact += other.resolved_exact;
        self.resolved_fallback += other.resolved_fallback;
        self.unresolved += other.unresolved;
        for (a, b) in self.by_sentiment.iter_mut().zip(other.by_sentiment) {
            *a += b;
        }
        self.controlled += other.controlled;
        self.edits_applied += other.edits_applied;
        self.aggregates_written += other.aggregates_written;
        self.index_rows_pruned += other.index_rows_pruned;
        self.editable_matched += other.editable_matched;
        self.editable_edits_preserved += other.editable_edits_preserved;
        self.editable_orphans_kept += other.editable_orphans_kept;
        self.alerts_due += other.alerts_due;
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== MediaPulse Run Complete ===")?;
        writeln!(f, "Dates processed:    {}", self.dates_processed)?;
        writeln!(f, "Dates skipped:      {}", self.dates_skipped)?;
        writeln!(f, "Rows received:      {}", self.rows_received)?;
        writeln!(f, "Rows blocked:       {}", self.rows_blocked)?;
        writeln!(f, "Rows duplicate:     {}", self.rows_duplicate)?;
        if self.rows_over_cap > 0 {
            writeln!(f, "Rows over cap:      {}", self.rows_over_cap)?;
        }
        writeln!(f, "Rows classified:    {}", self.rows_classified)?;
        writeln!(f, "\nResolution:")?;
        writeln!(f, "  Exact:     {}", self.resolved_exact)?;
        writeln!(f, "  Fallback:  {}", self.resolved_fallback)?;
        writeln!(f, "  Unresolved:{}", self.unresolved)?;
        let total = self.rows_classified.max(1);
        writeln!(f, "\nSentiment:")?;
        for (label, n) in ["Positive", "Neutral", "Negative"].iter().zip(self.by_sentiment) {
            writeln!(f, "  {label:<9} {n} ({:.0}%)", n as f64 / total as f64 * 100.0)?;
        }
        writeln!(f, "Controlled:         {}", self.controlled)?;
        if self.edits_applied > 0 {
            writeln!(f, "Hand edits applied: {}", self.edits_applied)?;
        }
        writeln!(f, "\nOutputs:")?;
        writeln!(f, "  Aggregates written: {}", self.aggregates_written)?;
        writeln!(f, "  Index rows pruned:  {}", self.index_rows_pruned)?;
        writeln!(f, "  Editable matched:   {}", self.editable_matched)?;
        writeln!(f, "  Edits preserved:    {}", self.editable_edits_preserved)?;
        writeln!(f, "  Stored rows kept:   {}", self.editable_orphans_kept)?;
        write!(f, "  Alerts due:         {}", self.alerts_due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_sums_fields() {
        let mut total = RunStats::default();
        let day = RunStats {
            dates_processed: 1,
            rows_classified: 4,
            by_sentiment: [1, 2, 1],
            ..RunStats::default()
        };
        total.absorb(&day);
        total.absorb(&day);
        assert_eq!(total.dates_processed, 2);
        assert_eq!(total.by_sentiment, [2, 4, 2]);
    }

    #[test]
    fn display_lists_sentiment_shares() {
        let stats = RunStats {
            rows_classified: 4,
            by_sentiment: [1, 2, 1],
            ..RunStats::default()
        };
        let text = stats.to_string();
        assert!(text.contains("Neutral   2 (50%)"));
    }
}
