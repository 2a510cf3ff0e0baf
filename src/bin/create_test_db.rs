use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, Month, Time};

use salesboard::{NewTransaction, Timestamp, initialize_db, insert_many};

/// A utility for creating a test database for the JSON API server of salesboard.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The year the sample sales are spread over.
    #[arg(long, short, default_value_t = 2022)]
    year: i32,
}

const CATEGORIES: [&str; 4] = ["electronics", "jewelery", "men's clothing", "women's clothing"];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating sample transactions...");

    let transactions = sample_transactions(args.year)?;
    let inserted = insert_many(&transactions, &conn)?;

    println!("Inserted {inserted} transactions.");
    println!("Success!");

    Ok(())
}

/// One sale every nine days through `year`, cycling through the categories,
/// with prices that cover every histogram bucket.
fn sample_transactions(year: i32) -> Result<Vec<NewTransaction>, Box<dyn Error>> {
    let first_day = Date::from_calendar_date(year, Month::January, 1)?;
    let sale_time = Time::from_hms(14, 59, 54)?;

    let transactions = (0..40_i64)
        .map(|i| {
            let date_of_sale = (first_day + Duration::days(i * 9))
                .with_time(sale_time)
                .assume_utc();
            let category = CATEGORIES[i as usize % CATEGORIES.len()];

            NewTransaction::build(&format!("Sample {category} item #{}", i + 1))
                .id(i + 1)
                .description(&format!("A sample item in the {category} category."))
                .price((i * 47 % 1000) as f64 + 0.99)
                .category(category)
                .image(&format!("https://example.com/images/{}.jpg", i + 1))
                .sold(i % 3 != 0)
                .date_of_sale(Timestamp::new(date_of_sale))
        })
        .collect();

    Ok(transactions)
}
