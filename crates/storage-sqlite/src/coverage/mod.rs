mod repository;

pub use repository::CoverageRepository;
