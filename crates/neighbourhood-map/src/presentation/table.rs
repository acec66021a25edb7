use super::{format_price, format_rating};
use crate::summary::NeighbourhoodSummary;

/// Summary fields a table column can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableColumn {
    Neighbourhood,
    AverageRating,
    AveragePrice,
    Latitude,
    Longitude,
}

impl TableColumn {
    pub const ALL: [TableColumn; 5] = [
        TableColumn::Neighbourhood,
        TableColumn::AverageRating,
        TableColumn::AveragePrice,
        TableColumn::Latitude,
        TableColumn::Longitude,
    ];

    /// Field name as it appears in the JSON payload.
    pub fn key(self) -> &'static str {
        match self {
            TableColumn::Neighbourhood => "neighbourhood",
            TableColumn::AverageRating => "average_rating",
            TableColumn::AveragePrice => "average_price",
            TableColumn::Latitude => "latitude",
            TableColumn::Longitude => "longitude",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TableColumn::Neighbourhood => "Neighbourhood",
            TableColumn::AverageRating => "Average Rating",
            TableColumn::AveragePrice => "Average Price",
            TableColumn::Latitude => "Latitude",
            TableColumn::Longitude => "Longitude",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.key() == key)
    }

    pub fn cell(self, summary: &NeighbourhoodSummary) -> String {
        match self {
            TableColumn::Neighbourhood => summary.neighbourhood.clone(),
            TableColumn::AverageRating => format_rating(summary.average_rating),
            TableColumn::AveragePrice => format_price(summary.average_price),
            TableColumn::Latitude => format!("{:.4}", summary.latitude),
            TableColumn::Longitude => format!("{:.4}", summary.longitude),
        }
    }
}

/// One rendered column. `accessor` is `None` when the requested key names
/// no summary field; such a column renders empty cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableField {
    pub label: String,
    pub key: String,
    pub accessor: Option<TableColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    fields: Vec<TableField>,
}

impl Default for TableSpec {
    fn default() -> Self {
        Self::from_columns([
            TableColumn::Neighbourhood,
            TableColumn::AverageRating,
            TableColumn::AveragePrice,
        ])
    }
}

impl TableSpec {
    pub fn from_columns<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = TableColumn>,
    {
        Self {
            fields: columns
                .into_iter()
                .map(|column| TableField {
                    label: column.label().to_string(),
                    key: column.key().to_string(),
                    accessor: Some(column),
                })
                .collect(),
        }
    }

    /// Builds a spec from `(label, key)` pairs resolved against the summary
    /// fields.
    pub fn from_keys<I, L, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, K)>,
        L: Into<String>,
        K: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(label, key)| {
                    let key = key.into();
                    TableField {
                        label: label.into(),
                        accessor: TableColumn::from_key(&key),
                        key,
                    }
                })
                .collect(),
        }
    }

    /// Parses `Label:key,Label:key`. An entry without a colon is used as
    /// both label and key. Blank input yields the default columns.
    pub fn parse(raw: &str) -> Self {
        let pairs: Vec<(String, String)> = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once(':') {
                Some((label, key)) => (label.trim().to_string(), key.trim().to_string()),
                None => (entry.to_string(), entry.to_string()),
            })
            .collect();

        if pairs.is_empty() {
            Self::default()
        } else {
            Self::from_keys(pairs)
        }
    }

    pub fn fields(&self) -> &[TableField] {
        &self.fields
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.label.as_str())
    }

    pub fn row(&self, summary: &NeighbourhoodSummary) -> Vec<String> {
        self.fields
            .iter()
            .map(|field| {
                field
                    .accessor
                    .map(|column| column.cell(summary))
                    .unwrap_or_default()
            })
            .collect()
    }

    pub fn rows(&self, summaries: &[NeighbourhoodSummary]) -> Vec<Vec<String>> {
        summaries.iter().map(|summary| self.row(summary)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_points() -> NeighbourhoodSummary {
        NeighbourhoodSummary {
            neighbourhood: "Five Points".to_string(),
            average_rating: Some(4.5),
            average_price: None,
            latitude: 39.7547,
            longitude: -104.9773,
        }
    }

    #[test]
    fn default_spec_renders_name_rating_price() {
        let spec = TableSpec::default();
        assert_eq!(
            spec.headers().collect::<Vec<_>>(),
            ["Neighbourhood", "Average Rating", "Average Price"]
        );
        assert_eq!(spec.row(&five_points()), ["Five Points", "4.50", "No data"]);
    }

    #[test]
    fn unknown_key_renders_empty_cells() {
        let spec = TableSpec::from_keys([("Name", "neighbourhood"), ("Hosts", "host_count")]);
        assert_eq!(spec.fields()[1].accessor, None);
        assert_eq!(spec.row(&five_points()), ["Five Points", ""]);
    }

    #[test]
    fn parses_query_style_column_lists() {
        let spec = TableSpec::parse("Where:neighbourhood, Lat:latitude ,longitude");
        assert_eq!(spec.headers().collect::<Vec<_>>(), ["Where", "Lat", "longitude"]);
        assert_eq!(spec.row(&five_points()), ["Five Points", "39.7547", "-104.9773"]);
        assert_eq!(TableSpec::parse(" , "), TableSpec::default());
    }
}
