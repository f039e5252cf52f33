use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const STUDENTS: usize = 240;
const SUBJECT_SLOTS: usize = 6;
const UNKNOWN_RATE: f64 = 0.04;

const BRANCHES: [&str; 4] = ["CSE", "ECE", "MECH", "CIVIL"];
const CAMPUSES: [&str; 3] = ["Main", "City", "Hill"];
const MAJORS: [&str; 5] = ["AI", "Cloud", "Cyber Security", "Data Science", "VLSI"];
const DIVISIONS: [&str; 4] = ["A", "B", "C", "D"];
const FIRST_NAMES: [&str; 8] = ["Asha", "Ravi", "Meera", "Arjun", "Kavya", "Rohan", "Isha", "Vikram"];
const LAST_NAMES: [&str; 6] = ["Patel", "Iyer", "Sharma", "Reddy", "Nair", "Gupta"];

/// Slots 1..3 are mandatory subjects; the rest are electives.
const MANDATORY: [&str; 6] = [
    "Engineering Maths", "Physics", "Chemistry", "Communication Skills", "Programming", "Ethics",
];
const ELECTIVES: [&str; 36] = [
    "Blockchain", "Compiler Design", "Computer Vision", "Cryptography", "Deep Learning",
    "Digital Marketing", "Distributed Systems", "Embedded Systems", "Entrepreneurship",
    "Financial Modelling", "Game Design", "Genomics", "Green Energy", "Human Computer Interaction",
    "Image Processing", "Internet of Things", "Linear Algebra", "Machine Learning",
    "Mobile Development", "Natural Language Processing", "Network Security", "Operations Research",
    "Optimisation", "Psychology", "Quantum Computing", "Reinforcement Learning", "Robotics",
    "Signal Processing", "Smart Cities", "Software Testing", "Space Technology", "Statistics",
    "Supply Chain", "UI Design", "Web Development", "Wireless Networks",
];

/// Minimal deterministic PRNG (splitmix64).
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Skewed pick: low indices come up far more often than high ones.
    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        let skewed = self.next_f64() * self.next_f64();
        items[(skewed * items.len() as f64) as usize % items.len()]
    }

    fn maybe_unknown<'a>(&mut self, value: &'a str) -> &'a str {
        if self.next_f64() < UNKNOWN_RATE {
            "Unknown"
        } else {
            value
        }
    }
}

struct Student {
    roll_no: String,
    sap_id: f64,
    name: String,
    branch: &'static str,
    campus: &'static str,
    major: &'static str,
    division: &'static str,
    subjects: Vec<Option<&'static str>>,
}

fn generate(rng: &mut SampleRng) -> Vec<Student> {
    (0..STUDENTS)
        .map(|i| {
            let branch = rng.pick(&BRANCHES);
            let mut subjects: Vec<Option<&'static str>> = Vec::with_capacity(SUBJECT_SLOTS);
            for slot in 0..SUBJECT_SLOTS {
                if slot < 3 {
                    subjects.push(Some(MANDATORY[(i + slot) % MANDATORY.len()]));
                } else if rng.next_f64() < 0.1 {
                    subjects.push(None);
                } else {
                    let elective = rng.pick(&ELECTIVES);
                    subjects.push(Some(rng.maybe_unknown(elective)));
                }
            }
            let name = format!("{} {}", rng.pick(&FIRST_NAMES), rng.pick(&LAST_NAMES));
            let campus = rng_pick_uniform(rng, &CAMPUSES);
            let major = rng.pick(&MAJORS);
            Student {
                roll_no: format!("{}{:04}", &branch[..1], i + 1),
                sap_id: 70_012_000_000.0 + i as f64,
                name,
                branch: rng.maybe_unknown(branch),
                campus: rng.maybe_unknown(campus),
                major: rng.maybe_unknown(major),
                division: rng_pick_uniform(rng, &DIVISIONS),
                subjects,
            }
        })
        .collect()
}

fn rng_pick_uniform<'a>(rng: &mut SampleRng, items: &[&'a str]) -> &'a str {
    items[(rng.next_u64() % items.len() as u64) as usize]
}

fn headers() -> Vec<String> {
    ["Roll No", "SAP ID", "Name", "Branch", "Campus", "Major", "Division"]
        .iter()
        .map(|h| h.to_string())
        .chain((1..=SUBJECT_SLOTS).map(|i| format!("Subject {i}")))
        .collect()
}

fn text_column(students: &[Student], field: impl Fn(&Student) -> &str) -> ArrayRef {
    Arc::new(StringArray::from(students.iter().map(field).collect::<Vec<_>>()))
}

fn write_parquet(students: &[Student], path: &str) -> Result<()> {
    let mut columns: Vec<ArrayRef> = vec![
        text_column(students, |s| s.roll_no.as_str()),
        // Spreadsheet exports store the SAP ID as a float.
        Arc::new(Float64Array::from(
            students.iter().map(|s| s.sap_id).collect::<Vec<_>>(),
        )),
        text_column(students, |s| s.name.as_str()),
        text_column(students, |s| s.branch),
        text_column(students, |s| s.campus),
        text_column(students, |s| s.major),
        text_column(students, |s| s.division),
    ];
    for slot in 0..SUBJECT_SLOTS {
        columns.push(Arc::new(StringArray::from(
            students.iter().map(|s| s.subjects[slot]).collect::<Vec<_>>(),
        )));
    }

    let fields: Vec<Field> = headers()
        .into_iter()
        .enumerate()
        .map(|(i, name)| match i {
            1 => Field::new(name, DataType::Float64, false),
            i if i >= 7 => Field::new(name, DataType::Utf8, true),
            _ => Field::new(name, DataType::Utf8, false),
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(students: &[Student], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(headers())?;
    for s in students {
        let sap_id = format!("{:.1}", s.sap_id);
        let mut record = vec![
            s.roll_no.as_str(),
            sap_id.as_str(),
            s.name.as_str(),
            s.branch,
            s.campus,
            s.major,
            s.division,
        ];
        record.extend(s.subjects.iter().map(|subject| subject.unwrap_or("")));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SampleRng(42);
    let students = generate(&mut rng);

    write_parquet(&students, "student_electives.parquet")?;
    write_csv(&students, "student_electives.csv")?;

    println!(
        "Wrote {} students ({} subject slots each) to student_electives.parquet and student_electives.csv",
        students.len(),
        SUBJECT_SLOTS
    );
    Ok(())
}
