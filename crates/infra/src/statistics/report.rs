//! Report rows and their console rendering.

use core::fmt;

use stockroom_products::Price;

/// Number of joined products in one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCount {
    pub store_name: String,
    pub count: u64,
}

/// Mean price of the joined products in one store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreAverage {
    pub store_name: String,
    pub average: f64,
}

/// Which end of the price range a [`PriceExtreme`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    MostExpensive,
    Cheapest,
}

/// The extreme price in one store and every product sold at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceExtreme {
    pub extreme: Extreme,
    pub store_name: String,
    pub price: Price,
    /// Ordered by product name. Never empty.
    pub products: Vec<String>,
}

/// All five reports, in the order they are printed.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsReport {
    pub product_counts: Vec<StoreCount>,
    pub average_prices: Vec<StoreAverage>,
    pub most_expensive: Vec<PriceExtreme>,
    pub cheapest: Vec<PriceExtreme>,
    pub under_threshold: Vec<StoreCount>,
    pub threshold: i64,
}

impl StatisticsReport {
    /// One console line per store per report.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.extend(
            self.product_counts
                .iter()
                .map(|c| format!("Total products in store {}: {}", c.store_name, c.count)),
        );
        lines.extend(self.average_prices.iter().map(StoreAverage::to_string));
        lines.extend(self.most_expensive.iter().map(PriceExtreme::to_string));
        lines.extend(self.cheapest.iter().map(PriceExtreme::to_string));
        lines.extend(self.under_threshold.iter().map(|c| {
            format!(
                "Products priced at most {} in store {}: {}",
                self.threshold, c.store_name, c.count
            )
        }));
        lines
    }

    pub fn is_empty(&self) -> bool {
        self.product_counts.is_empty()
            && self.average_prices.is_empty()
            && self.most_expensive.is_empty()
            && self.cheapest.is_empty()
            && self.under_threshold.is_empty()
    }
}

impl fmt::Display for StoreAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Average price in store {}: {:.2}", self.store_name, self.average)
    }
}

impl fmt::Display for PriceExtreme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.extreme {
            Extreme::MostExpensive => "Most expensive",
            Extreme::Cheapest => "Cheapest",
        };
        write!(
            f,
            "{label} products in store {}: {} (price {})",
            self.store_name,
            self.products.join(", "),
            self.price
        )
    }
}

impl fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> StatisticsReport {
        StatisticsReport {
            product_counts: vec![StoreCount {
                store_name: "north".into(),
                count: 3,
            }],
            average_prices: vec![StoreAverage {
                store_name: "north".into(),
                average: 100.0,
            }],
            most_expensive: vec![PriceExtreme {
                extreme: Extreme::MostExpensive,
                store_name: "north".into(),
                price: Price::new(150).unwrap(),
                products: vec!["caviar".into(), "truffle".into()],
            }],
            cheapest: vec![PriceExtreme {
                extreme: Extreme::Cheapest,
                store_name: "north".into(),
                price: Price::new(50).unwrap(),
                products: vec!["bread".into()],
            }],
            under_threshold: vec![StoreCount {
                store_name: "north".into(),
                count: 2,
            }],
            threshold: 100,
        }
    }

    #[test]
    fn lines_follow_fixed_report_order() {
        assert_eq!(
            report().lines(),
            [
                "Total products in store north: 3",
                "Average price in store north: 100.00",
                "Most expensive products in store north: caviar, truffle (price 150)",
                "Cheapest products in store north: bread (price 50)",
                "Products priced at most 100 in store north: 2",
            ]
        );
    }

    #[test]
    fn display_writes_one_line_each() {
        assert_eq!(report().to_string().lines().count(), 5);
    }

    #[test]
    fn average_is_rendered_with_two_decimals() {
        let avg = StoreAverage {
            store_name: "south".into(),
            average: 200.0 / 3.0,
        };
        assert_eq!(avg.to_string(), "Average price in store south: 66.67");
    }
}
