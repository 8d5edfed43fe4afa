//! Demo catalog loaded by `bookshelf-cli seed`.

use super::models::{CreateBook, DEFAULT_ACTOR};
use super::store::{BookStore, StoreError};

/// Well-known software books as `(title, author)` pairs.
pub const DEMO_BOOKS: &[(&str, &str)] = &[
    ("Clean Code", "Robert C. Martin"),
    ("The Pragmatic Programmer", "Andrew Hunt"),
    ("Design Patterns", "Erich Gamma"),
    ("Refactoring", "Martin Fowler"),
    ("Introduction to Algorithms", "Cormen/Leiserson/Rivest/Stein"),
    ("Domain-Driven Design", "Eric Evans"),
    ("Effective Java", "Joshua Bloch"),
    ("You Don't Know JS", "Kyle Simpson"),
    ("Python Crash Course", "Eric Matthes"),
    ("Fluent Python", "Luciano Ramalho"),
    ("JavaScript: The Good Parts", "Douglas Crockford"),
    ("Head First Design Patterns", "Eric Freeman"),
    ("Test-Driven Development", "Kent Beck"),
    ("Continuous Delivery", "Jez Humble"),
    ("Working Effectively with Legacy Code", "Michael Feathers"),
    ("Programming Pearls", "Jon Bentley"),
    ("Code Complete", "Steve McConnell"),
    ("Structure and Interpretation of Computer Programs", "Abelson & Sussman"),
    ("Algorithms", "Robert Sedgewick"),
    ("Programming Rust", "Jim Blandy"),
    ("Learning Python", "Mark Lutz"),
    ("Automate the Boring Stuff with Python", "Al Sweigart"),
    ("The Art of Computer Programming", "Donald Knuth"),
    ("Effective Python", "Brett Slatkin"),
    ("Modern Operating Systems", "Andrew Tanenbaum"),
    ("Computer Networking: A Top-Down Approach", "Kurose & Ross"),
    ("Operating System Concepts", "Silberschatz, Galvin, Gagne"),
    ("Compilers: Principles, Techniques, and Tools", "Aho, Lam, Sethi, Ullman"),
    ("Clean Architecture", "Robert C. Martin"),
    ("Agile Software Development", "Robert C. Martin"),
    ("Building Microservices", "Sam Newman"),
    ("Microservices Patterns", "Chris Richardson"),
    ("RESTful Web APIs", "Leonard Richardson"),
    ("Spring in Action", "Craig Walls"),
    ("Hibernate in Action", "Christian Bauer"),
    ("Pro Git", "Scott Chacon"),
    ("Kubernetes Up & Running", "Brendan Burns"),
    ("Docker Deep Dive", "Nigel Poulton"),
    ("Terraform: Up & Running", "Yevgeniy Brikman"),
    ("Cloud Native Patterns", "Cornelia Davis"),
    ("Designing Data-Intensive Applications", "Martin Kleppmann"),
    ("Fundamentals of Database Systems", "Elmasri & Navathe"),
    ("SQL Antipatterns", "Bill Karwin"),
    ("NoSQL Distilled", "Pramod J. Sadalage"),
    ("Data Science for Business", "Provost & Fawcett"),
    ("Hands-On Machine Learning with Scikit-Learn, Keras, and TensorFlow", "Aurélien Géron"),
    ("Deep Learning", "Ian Goodfellow"),
    ("Pattern Recognition and Machine Learning", "Christopher Bishop"),
    ("Artificial Intelligence: A Modern Approach", "Russell & Norvig"),
    ("Grokking Algorithms", "Aditya Bhargava"),
    ("Eloquent JavaScript", "Marijn Haverbeke"),
    ("Java Concurrency in Practice", "Brian Goetz"),
    ("C Programming Language", "Brian Kernighan & Dennis Ritchie"),
    ("Programming in Haskell", "Graham Hutton"),
    ("Learn You a Haskell for Great Good!", "Miran Lipovača"),
    ("The Rust Programming Language", "Steve Klabnik & Carol Nichols"),
    ("Programming Elixir", "Dave Thomas"),
    ("Programming Erlang", "Joe Armstrong"),
    ("Seven Languages in Seven Weeks", "Bruce Tate"),
    ("Learn Python the Hard Way", "Zed Shaw"),
];

/// Create every demo book whose title/author pair is not already active.
///
/// Returns the number of books inserted; running it twice inserts nothing
/// the second time.
pub async fn seed_demo_books(store: &dyn BookStore) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for &(title, author) in DEMO_BOOKS {
        let book = CreateBook {
            title: title.to_string(),
            author: author.to_string(),
            created_by: Some(DEFAULT_ACTOR.to_string()),
        };

        match store.create(&book).await {
            Ok(_) => inserted += 1,
            Err(StoreError::Duplicate { .. }) => {
                tracing::debug!(title, author, "demo book already present");
            }
            Err(err) => return Err(err.into()),
        }
    }

    tracing::info!(
        inserted,
        skipped = DEMO_BOOKS.len() - inserted,
        "demo catalog seeded"
    );
    Ok(inserted)
}
