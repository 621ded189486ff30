use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// NOC code, region name.  `ZZX` is deliberately missing from the region file.
const COUNTRIES: [(&str, &str); 9] = [
    ("USA", "USA"),
    ("GBR", "UK"),
    ("FRA", "France"),
    ("GER", "Germany"),
    ("NOR", "Norway"),
    ("CHN", "China"),
    ("AUS", "Australia"),
    ("KEN", "Kenya"),
    ("ZZX", ""),
];

const SUMMER_SPORTS: [&str; 6] = ["Athletics", "Swimming", "Rowing", "Fencing", "Judo", "Cycling"];
const WINTER_SPORTS: [&str; 4] = ["Alpine Skiing", "Biathlon", "Speed Skating", "Ice Hockey"];
const FIRST_NAMES: [&str; 8] = ["Anna", "Ben", "Chen", "Dara", "Emil", "Fatima", "Goran", "Hana"];
const LAST_NAMES: [&str; 6] = ["Smith", "Okoye", "Larsen", "Dubois", "Wang", "Keller"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One generated athlete-event row.
struct Entry {
    id: i64,
    name: String,
    sex: &'static str,
    age: Option<f64>,
    height: Option<f64>,
    weight: Option<f64>,
    noc: &'static str,
    team: &'static str,
    year: i64,
    season: &'static str,
    sport: &'static str,
    medal: Option<&'static str>,
    kind: &'static str,
}

impl Entry {
    fn games(&self) -> String {
        format!("{} {}", self.year, self.season)
    }

    fn event(&self) -> String {
        let sex = if self.sex == "M" { "Men's" } else { "Women's" };
        format!("{} {sex} {}", self.sport, self.kind)
    }
}

fn editions() -> Vec<(i64, &'static str)> {
    let summer = (1896..=2016)
        .step_by(4)
        .filter(|y| ![1916, 1940, 1944].contains(y))
        .map(|y| (y, "Summer"));
    let winter = (1924..=1992)
        .step_by(4)
        .chain((1994..=2014).step_by(4))
        .filter(|y| ![1940, 1944].contains(y))
        .map(|y| (y, "Winter"));
    summer.chain(winter).collect()
}

fn generate(rng: &mut SimpleRng) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut next_id: i64 = 1;

    for (year, season) in editions() {
        let sports: &[&'static str] = if season == "Summer" {
            &SUMMER_SPORTS
        } else {
            &WINTER_SPORTS
        };
        // Women's participation grows over time.
        let female_share = ((year - 1896) as f64 / 120.0 * 0.5).clamp(0.02, 0.48);

        for &(noc, team) in &COUNTRIES {
            let athletes = 3 + (rng.next_u64() % 6) as usize;
            for _ in 0..athletes {
                let sex = if rng.next_f64() < female_share { "F" } else { "M" };
                let roll = rng.next_f64();
                let medal = match roll {
                    r if r < 0.05 => Some("Gold"),
                    r if r < 0.10 => Some("Silver"),
                    r if r < 0.15 => Some("Bronze"),
                    _ => None,
                };
                let age = (rng.next_f64() > 0.05).then(|| rng.gauss(25.0, 4.0).round().max(14.0));
                let height = (year > 1950).then(|| rng.gauss(176.0, 9.0).round());
                let weight = height.map(|h| (h - 105.0 + rng.gauss(0.0, 6.0)).round());

                entries.push(Entry {
                    id: next_id,
                    name: format!("{} {}", rng.pick(&FIRST_NAMES), rng.pick(&LAST_NAMES)),
                    sex,
                    age,
                    height,
                    weight,
                    noc,
                    team: if team.is_empty() { "Independent" } else { team },
                    year,
                    season,
                    sport: *rng.pick(sports),
                    medal,
                    kind: if rng.next_f64() < 0.7 { "Individual" } else { "Team" },
                });
                next_id += 1;
            }
        }
    }
    entries
}

fn write_regions(path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["noc_region", "reg"])?;
    for &(noc, region) in COUNTRIES.iter().filter(|(_, r)| !r.is_empty()) {
        writer.write_record([noc, region])?;
    }
    writer.flush()?;
    Ok(())
}

fn optional(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.1}")).unwrap_or_default()
}

fn write_records_csv(path: &str, entries: &[Entry]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "ID", "Name", "Sex", "Age", "Height", "Weight", "Team", "NOC", "Games", "Year", "Season",
        "City", "Sport", "Event", "Medal", "Type",
    ])?;
    for e in entries {
        writer.write_record([
            e.id.to_string(),
            e.name.clone(),
            e.sex.to_string(),
            optional(e.age),
            optional(e.height),
            optional(e.weight),
            e.team.to_string(),
            e.noc.to_string(),
            e.games(),
            e.year.to_string(),
            e.season.to_string(),
            String::new(),
            e.sport.to_string(),
            e.event(),
            e.medal.unwrap_or_default().to_string(),
            e.kind.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_records_parquet(path: &str, entries: &[Entry]) -> Result<()> {
    let text = |f: &dyn Fn(&Entry) -> String| -> Arc<StringArray> {
        Arc::new(StringArray::from(entries.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("ID", DataType::Int64, false),
        Field::new("Name", DataType::Utf8, false),
        Field::new("Sex", DataType::Utf8, false),
        Field::new("Age", DataType::Float64, true),
        Field::new("NOC", DataType::Utf8, false),
        Field::new("Year", DataType::Int64, false),
        Field::new("Season", DataType::Utf8, false),
        Field::new("Sport", DataType::Utf8, false),
        Field::new("Event", DataType::Utf8, false),
        Field::new("Medal", DataType::Utf8, true),
        Field::new("Type", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(entries.iter().map(|e| e.id))),
            text(&|e: &Entry| e.name.clone()),
            text(&|e: &Entry| e.sex.to_string()),
            Arc::new(Float64Array::from(entries.iter().map(|e| e.age).collect::<Vec<_>>())),
            text(&|e: &Entry| e.noc.to_string()),
            Arc::new(Int64Array::from_iter_values(entries.iter().map(|e| e.year))),
            text(&|e: &Entry| e.season.to_string()),
            text(&|e: &Entry| e.sport.to_string()),
            text(&|e: &Entry| e.event()),
            Arc::new(StringArray::from(
                entries.iter().map(|e| e.medal).collect::<Vec<_>>(),
            )),
            text(&|e: &Entry| e.kind.to_string()),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let entries = generate(&mut rng);

    write_regions("noc_region.csv")?;
    write_records_csv("dataset_olympics.csv", &entries)?;
    write_records_parquet("dataset_olympics.parquet", &entries)?;

    println!(
        "Wrote {} entries for {} editions to dataset_olympics.csv / .parquet and noc_region.csv",
        entries.len(),
        editions().len()
    );
    Ok(())
}
