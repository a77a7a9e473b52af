//! Demo dataset for a fresh dashboard.

use crate::types::{Holding, Position};

fn holding(name: &str, qty: i64, avg: f64, price: f64, net: &str, day: &str, is_loss: bool) -> Holding {
    Holding {
        name: name.to_string(),
        qty,
        avg,
        price,
        net: net.to_string(),
        day: day.to_string(),
        is_loss,
    }
}

pub fn demo_holdings() -> Vec<Holding> {
    vec![
        holding("BHARTIARTL", 2, 538.05, 541.15, "+0.58%", "+2.99%", false),
        holding("HDFCBANK", 2, 1383.4, 1522.35, "+10.04%", "+0.11%", false),
        holding("HINDUNILVR", 1, 2335.85, 2417.4, "+3.49%", "+0.21%", false),
        holding("INFY", 1, 1350.5, 1555.45, "+15.18%", "-1.60%", true),
        holding("ITC", 5, 202.0, 207.9, "+2.92%", "+0.80%", false),
    ]
}

pub fn demo_positions() -> Vec<Position> {
    vec![
        Position {
            product: "CNC".to_string(),
            name: "EVEREADY".to_string(),
            qty: 2,
            avg: 316.27,
            price: 312.35,
            net: "+0.58%".to_string(),
            day: "-1.24%".to_string(),
            is_loss: true,
        },
        Position {
            product: "CNC".to_string(),
            name: "JUBLFOOD".to_string(),
            qty: 1,
            avg: 3124.75,
            price: 3082.65,
            net: "+10.04%".to_string(),
            day: "-1.35%".to_string(),
            is_loss: true,
        },
    ]
}
