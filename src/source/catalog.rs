use super::data_table::DataTable;
use crate::schema::table_name_for;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    /// `"<prefix> 1"`, `"<prefix> 2"`, ...
    Indexed(&'static str),
    /// Consecutive years starting at the given one.
    YearSequence(i32),
    Constant(&'static str),
}

impl ColumnDefault {
    pub fn value_at(&self, row: usize) -> String {
        match self {
            ColumnDefault::Indexed(prefix) => format!("{} {}", prefix, row + 1),
            ColumnDefault::YearSequence(start) => (*start as i64 + row as i64).to_string(),
            ColumnDefault::Constant(value) => value.to_string(),
        }
    }
}

/// Column looked up from another column's value when the file lacks it.
#[derive(Debug, Clone, Copy)]
pub struct DerivedColumn {
    pub name: &'static str,
    pub key: &'static str,
    pub values: &'static [(&'static str, &'static str)],
    pub default: &'static str,
}

impl DerivedColumn {
    pub fn value_for(&self, key: &str) -> &'static str {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map_or(self.default, |&(_, v)| v)
    }
}

/// Rows shown instead of the file's when its required columns are absent.
#[derive(Debug, Clone, Copy)]
pub struct SampleTable {
    pub columns: &'static [&'static str],
    pub rows: &'static [&'static [&'static str]],
}

impl SampleTable {
    pub fn to_table(&self) -> DataTable {
        DataTable::new(
            self.columns.iter().map(|c| c.to_string()).collect(),
            self.rows
                .iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DatasetSpec {
    pub name: &'static str,
    pub file: &'static str,
    pub required: &'static [(&'static str, ColumnDefault)],
    pub derived: &'static [DerivedColumn],
    pub sample: Option<SampleTable>,
}

/// What [`DatasetSpec::conform`] changed in a loaded table.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Conformance {
    pub missing: Vec<&'static str>,
    pub substituted: bool,
    pub derived: Vec<&'static str>,
}

use ColumnDefault::{Constant, Indexed, YearSequence};

const STATE_HDI: &[(&str, &str)] = &[
    ("Kerala", "0.782"),
    ("Delhi", "0.746"),
    ("Goa", "0.761"),
    ("Punjab", "0.723"),
    ("Tamil Nadu", "0.708"),
    ("Himachal Pradesh", "0.725"),
    ("Maharashtra", "0.696"),
    ("Karnataka", "0.682"),
    ("Telangana", "0.669"),
    ("Gujarat", "0.672"),
    ("Haryana", "0.708"),
    ("Uttarakhand", "0.684"),
    ("West Bengal", "0.641"),
    ("Andhra Pradesh", "0.649"),
    ("Rajasthan", "0.629"),
    ("Odisha", "0.606"),
    ("Assam", "0.613"),
    ("Jharkhand", "0.599"),
    ("Chhattisgarh", "0.613"),
    ("Madhya Pradesh", "0.603"),
    ("Uttar Pradesh", "0.596"),
    ("Bihar", "0.574"),
    ("Manipur", "0.697"),
    ("Tripura", "0.658"),
    ("Meghalaya", "0.636"),
    ("Nagaland", "0.679"),
    ("Sikkim", "0.716"),
    ("Mizoram", "0.705"),
    ("Arunachal Pradesh", "0.662"),
    ("Jammu and Kashmir", "0.688"),
    ("Chandigarh", "0.775"),
    ("Puducherry", "0.738"),
    ("Andaman and Nicobar Islands", "0.74"),
    ("Lakshadweep", "0.712"),
    ("Dadra and Nagar Haveli", "0.663"),
    ("Daman and Diu", "0.681"),
    ("Ladakh", "0.674"),
];

const STATE_URBANIZATION: &[(&str, &str)] = &[
    ("Delhi", "97.5"),
    ("Chandigarh", "97.3"),
    ("Puducherry", "68.3"),
    ("Goa", "62.2"),
    ("Mizoram", "52.1"),
    ("Tamil Nadu", "48.4"),
    ("Kerala", "47.7"),
    ("Maharashtra", "45.2"),
    ("Gujarat", "42.6"),
    ("Karnataka", "38.6"),
    ("Telangana", "38.9"),
    ("Punjab", "37.5"),
    ("Haryana", "34.8"),
    ("Andhra Pradesh", "33.5"),
    ("West Bengal", "31.9"),
    ("Uttarakhand", "30.2"),
    ("Jammu and Kashmir", "27.4"),
    ("Nagaland", "28.9"),
    ("Manipur", "29.2"),
    ("Jharkhand", "24.1"),
    ("Rajasthan", "24.9"),
    ("Chhattisgarh", "23.2"),
    ("Madhya Pradesh", "27.6"),
    ("Odisha", "16.7"),
    ("Assam", "14.1"),
    ("Bihar", "11.3"),
    ("Himachal Pradesh", "10.0"),
    ("Sikkim", "25.1"),
    ("Tripura", "26.2"),
    ("Meghalaya", "20.1"),
    ("Arunachal Pradesh", "22.9"),
    ("Uttar Pradesh", "22.3"),
    ("Andaman and Nicobar Islands", "37.7"),
    ("Dadra and Nagar Haveli", "47.2"),
    ("Daman and Diu", "75.2"),
    ("Lakshadweep", "78.1"),
    ("Ladakh", "21.4"),
];

const TERRAIN_SAMPLE: SampleTable = SampleTable {
    columns: &["Terrain_Type", "Percentage", "Area_sq_km"],
    rows: &[
        &["Mountains", "15.3", "502000"],
        &["Plains", "43.2", "1419000"],
        &["Plateaus", "27.8", "914000"],
        &["Deserts", "7.9", "260000"],
        &["Coastlines", "3.5", "115000"],
        &["Forests", "2.3", "77000"],
    ],
};

pub static CATALOG: &[DatasetSpec] = &[
    DatasetSpec {
        name: "linguistic",
        file: "languages.csv",
        required: &[
            ("Language", Indexed("Language")),
            ("Speakers", Constant("0")),
            ("Percentage", Constant("0.0")),
        ],
        derived: &[],
        sample: None,
    },
    DatasetSpec {
        name: "religious",
        file: "religions.csv",
        required: &[
            ("Religion", Indexed("Religion")),
            ("Percentage", Constant("0.0")),
            ("Population", Constant("0")),
        ],
        derived: &[],
        sample: None,
    },
    DatasetSpec {
        name: "state",
        file: "states.csv",
        required: &[
            ("State", Indexed("State")),
            ("Population (millions)", Constant("0.0")),
            ("Area (sq km)", Constant("0")),
            ("Literacy Rate (%)", Constant("0.0")),
            ("Region", Constant("Unknown")),
        ],
        derived: &[
            DerivedColumn {
                name: "HDI",
                key: "State",
                values: STATE_HDI,
                default: "0.65",
            },
            DerivedColumn {
                name: "Urbanization (%)",
                key: "State",
                values: STATE_URBANIZATION,
                default: "35.0",
            },
        ],
        sample: None,
    },
    DatasetSpec {
        name: "cultural",
        file: "cultural_heritage.csv",
        required: &[
            ("Cultural Element", Indexed("Element")),
            ("Count", Constant("0")),
            ("Description", Constant("No description available")),
            ("Historical Period", Constant("Unknown period")),
            ("Region of Origin", Constant("All India")),
        ],
        derived: &[],
        sample: None,
    },
    DatasetSpec {
        name: "population",
        file: "population_growth.csv",
        required: &[
            ("Year", YearSequence(1950)),
            ("Population (millions)", Constant("0.0")),
            ("Urban Population (%)", Constant("0.0")),
            ("Rural Population (%)", Constant("0.0")),
        ],
        derived: &[],
        sample: None,
    },
    DatasetSpec {
        name: "economic",
        file: "economic_sectors.csv",
        required: &[
            ("Year", YearSequence(1950)),
            ("Agriculture", Constant("0.0")),
            ("Industry", Constant("0.0")),
            ("Services", Constant("0.0")),
        ],
        derived: &[],
        sample: None,
    },
    DatasetSpec {
        name: "historical",
        file: "historical_timeline.csv",
        required: &[
            ("Year", Constant("0")),
            ("Era", Constant("Unknown")),
            ("Event", Constant("Unknown Event")),
            ("Significance", Constant("Unknown significance")),
        ],
        derived: &[],
        sample: None,
    },
    DatasetSpec {
        name: "festivals",
        file: "festivals.csv",
        required: &[
            ("Festival", Indexed("Festival")),
            ("Religion", Constant("Unknown")),
            ("Region", Constant("All India")),
            ("Month", Constant("January")),
        ],
        derived: &[],
        sample: None,
    },
    DatasetSpec {
        name: "tourism",
        file: "tourism.csv",
        required: &[
            ("Destination", Indexed("Destination")),
            ("State", Constant("Unknown")),
            ("Type", Constant("Monument")),
            ("Visitors_Annual", Constant("0")),
        ],
        derived: &[],
        sample: None,
    },
    DatasetSpec {
        name: "education",
        file: "education.csv",
        required: &[
            ("State", Indexed("State")),
            ("Literacy_Rate", Constant("0.0")),
            ("Primary_Enrollment", Constant("0.0")),
            ("Higher_Education_GER", Constant("0.0")),
        ],
        derived: &[],
        sample: None,
    },
    DatasetSpec {
        name: "geography",
        file: "geography.csv",
        required: &[
            ("Terrain_Type", Constant("Unknown")),
            ("Percentage", Constant("0.0")),
        ],
        derived: &[],
        sample: Some(TERRAIN_SAMPLE),
    },
];

pub fn find_dataset(name: &str) -> Option<&'static DatasetSpec> {
    CATALOG.iter().find(|d| d.name == name)
}

impl DatasetSpec {
    /// Name of the warehouse table provisioned from this dataset's file.
    pub fn table_name(&self) -> String {
        table_name_for(Path::new(self.file))
    }

    pub fn missing_columns(&self, table: &DataTable) -> Vec<&'static str> {
        self.required
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| !table.has_column(name))
            .collect()
    }

    /// Every column name the dashboard reads from this dataset.
    pub fn display_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required
            .iter()
            .map(|(name, _)| *name)
            .chain(self.derived.iter().map(|d| d.name))
            .chain(self.sample.iter().flat_map(|s| s.columns.iter().copied()))
    }

    /// Brings a loaded table into the shape the dashboard expects. Datasets
    /// with a sample table replace the rows when required columns are
    /// missing; the others get default values. Derived columns are added
    /// last.
    pub fn conform(&self, table: &mut DataTable) -> Conformance {
        let mut conformance = Conformance::default();
        match self.sample {
            Some(sample) if !self.missing_columns(table).is_empty() => {
                conformance.missing = self.missing_columns(table);
                conformance.substituted = true;
                *table = sample.to_table();
            }
            _ => conformance.missing = self.fill_missing(table),
        }

        for derived in self.derived {
            if table.has_column(derived.name) {
                continue;
            }
            let Some(keys) = table.column(derived.key) else {
                continue;
            };
            let values: Vec<&'static str> = keys.iter().map(|k| derived.value_for(k)).collect();
            table.push_column(derived.name, |row| values[row].to_string());
            conformance.derived.push(derived.name);
        }
        conformance
    }

    /// Adds every absent required column with its default values and returns
    /// the names that were added.
    pub fn fill_missing(&self, table: &mut DataTable) -> Vec<&'static str> {
        let missing = self.missing_columns(table);
        for (name, default) in self.required.iter().filter(|(n, _)| missing.contains(n)) {
            table.push_column(*name, |row| default.value_at(row));
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_dataset() {
        let state = find_dataset("state").unwrap();
        assert_eq!(state.file, "states.csv");
        assert_eq!(state.table_name(), "STATES");
        assert!(find_dataset("weather").is_none());
    }

    #[test]
    fn test_catalog_names_are_unique() {
        let mut names: Vec<&str> = CATALOG.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn test_fill_missing_columns() {
        let dataset = find_dataset("population").unwrap();
        let mut table = DataTable::new(
            vec!["Population (millions)".to_string()],
            vec![vec!["361".to_string()], vec!["439".to_string()]],
        );

        let added = dataset.fill_missing(&mut table);

        assert_eq!(
            added,
            vec!["Year", "Urban Population (%)", "Rural Population (%)"]
        );
        assert_eq!(table.column("Year"), Some(vec!["1950", "1951"]));
        assert_eq!(table.column("Urban Population (%)"), Some(vec!["0.0", "0.0"]));
        assert_eq!(table.column("Population (millions)"), Some(vec!["361", "439"]));
    }

    #[test]
    fn test_state_gets_hdi_and_urbanization() {
        let state = find_dataset("state").unwrap();
        let mut table = DataTable::new(
            vec!["State".to_string(), "Region".to_string()],
            vec![
                vec!["Kerala".to_string(), "South".to_string()],
                vec!["Atlantis".to_string(), "Nowhere".to_string()],
            ],
        );

        let conformance = state.conform(&mut table);

        assert_eq!(conformance.derived, vec!["HDI", "Urbanization (%)"]);
        assert!(!conformance.substituted);
        assert_eq!(table.column("HDI"), Some(vec!["0.782", "0.65"]));
        assert_eq!(table.column("Urbanization (%)"), Some(vec!["47.7", "35.0"]));
        assert_eq!(table.column("Region"), Some(vec!["South", "Nowhere"]));
    }

    #[test]
    fn test_existing_hdi_is_kept() {
        let state = find_dataset("state").unwrap();
        let mut table = DataTable::new(
            vec!["State".to_string(), "HDI".to_string()],
            vec![vec!["Kerala".to_string(), "0.8".to_string()]],
        );
        let conformance = state.conform(&mut table);
        assert_eq!(conformance.derived, vec!["Urbanization (%)"]);
        assert_eq!(table.column("HDI"), Some(vec!["0.8"]));
    }

    #[test]
    fn test_geography_without_terrain_uses_sample() {
        let geography = find_dataset("geography").unwrap();
        let mut table = DataTable::new(
            vec!["Feature".to_string(), "Percentage".to_string()],
            vec![vec!["Rivers".to_string(), "1.0".to_string()]],
        );

        let conformance = geography.conform(&mut table);

        assert!(conformance.substituted);
        assert_eq!(conformance.missing, vec!["Terrain_Type"]);
        assert_eq!(table.columns, vec!["Terrain_Type", "Percentage", "Area_sq_km"]);
        assert_eq!(table.len(), 6);
        assert_eq!(table.column("Terrain_Type").unwrap()[1], "Plains");
    }

    #[test]
    fn test_geography_with_terrain_is_kept() {
        let geography = find_dataset("geography").unwrap();
        let mut table = DataTable::new(
            vec!["Terrain_Type".to_string(), "Percentage".to_string()],
            vec![vec!["Mountains".to_string(), "16".to_string()]],
        );
        assert_eq!(geography.conform(&mut table), Conformance::default());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_indexed_default() {
        assert_eq!(Indexed("State").value_at(2), "State 3");
    }

    #[test]
    fn test_complete_table_needs_nothing() {
        let dataset = find_dataset("economic").unwrap();
        let mut table = DataTable::new(
            vec![
                "Year".to_string(),
                "Agriculture".to_string(),
                "Industry".to_string(),
                "Services".to_string(),
            ],
            vec![],
        );
        assert!(dataset.fill_missing(&mut table).is_empty());
        assert_eq!(table.columns.len(), 4);
    }
}
