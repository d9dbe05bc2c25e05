//! Aggregates over the final, sequenced record list.

use crate::fields::round_cents;
use crate::types::{CategoryStats, StatementStatistics, TransactionRecord};

pub fn compute(records: &[TransactionRecord]) -> StatementStatistics {
    let mut stats = StatementStatistics {
        transaction_count: records.len(),
        ..Default::default()
    };

    let mut net_movement = 0.0;
    for r in records {
        net_movement += r.net;
        if r.net > 0.0 {
            stats.inflow_count += 1;
            stats.total_inflow += r.net;
            stats.max_inflow = stats.max_inflow.max(r.net);
        } else if r.net < 0.0 {
            stats.outflow_count += 1;
            stats.total_outflow += -r.net;
            stats.max_outflow = stats.max_outflow.max(-r.net);
        }

        let entry = stats
            .categories
            .entry(r.category.clone())
            .or_insert_with(CategoryStats::default);
        entry.count += 1;
        entry.total += r.net;
        entry.sequences.push(r.sequence);
    }

    if stats.inflow_count > 0 {
        stats.average_inflow = round_cents(stats.total_inflow / stats.inflow_count as f64);
    }
    if stats.outflow_count > 0 {
        stats.average_outflow = round_cents(stats.total_outflow / stats.outflow_count as f64);
    }
    stats.total_inflow = round_cents(stats.total_inflow);
    stats.total_outflow = round_cents(stats.total_outflow);
    stats.net_movement = round_cents(net_movement);
    for c in stats.categories.values_mut() {
        c.total = round_cents(c.total);
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(seq: usize, net: f64, category: &str) -> TransactionRecord {
        TransactionRecord {
            transaction_date: None,
            value_date: None,
            outflow: (net < 0.0).then_some(-net),
            inflow: (net > 0.0).then_some(net),
            net,
            description: String::new(),
            category: category.to_string(),
            page: 1,
            sequence: seq,
        }
    }

    #[test]
    fn test_empty_set_is_all_zero() {
        let s = compute(&[]);
        assert_eq!(s.transaction_count, 0);
        assert_eq!(s.average_inflow, 0.0);
        assert_eq!(s.average_outflow, 0.0);
        assert_eq!(s.max_outflow, 0.0);
        assert!(s.categories.is_empty());
    }

    #[test]
    fn test_inflow_outflow_populations() {
        let records = vec![
            rec(1, -10.0, "Trasporti"),
            rec(2, 1500.0, "Stipendio"),
            rec(3, -45.5, "Spesa Alimentari"),
            rec(4, 0.0, "Other"),
        ];
        let s = compute(&records);
        assert_eq!(s.transaction_count, 4);
        assert_eq!(s.inflow_count, 1);
        assert_eq!(s.outflow_count, 2);
        assert_eq!(s.total_inflow, 1500.0);
        assert_eq!(s.total_outflow, 55.5);
        assert_eq!(s.average_outflow, 27.75);
        assert_eq!(s.max_outflow, 45.5);
        assert_eq!(s.max_inflow, 1500.0);
        assert_eq!(s.net_movement, 1444.5);
    }

    #[test]
    fn test_category_rollup_closure() {
        let records = vec![
            rec(1, -12.30, "Ristorazione"),
            rec(2, -7.10, "Ristorazione"),
            rec(3, 250.0, "Affitto"),
            rec(4, -0.99, "Other"),
            rec(5, -19.99, "PayPal"),
        ];
        let s = compute(&records);

        let rollup_total: f64 = s.categories.values().map(|c| c.total).sum();
        let net_total: f64 = records.iter().map(|r| r.net).sum();
        assert!((rollup_total - net_total).abs() < 1e-6);

        let rollup_count: usize = s.categories.values().map(|c| c.count).sum();
        assert_eq!(rollup_count, records.len());

        let rist = &s.categories["Ristorazione"];
        assert_eq!(rist.count, 2);
        assert_eq!(rist.sequences, vec![1, 2]);
        assert_eq!(rist.total, -19.4);
    }
}
