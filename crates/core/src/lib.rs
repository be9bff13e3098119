pub mod shared {
    pub mod constants;
    pub mod model_resolver;
    pub mod photo_record;
    pub mod thumbnail;
}

pub mod grouping {
    pub mod domain {
        pub mod chain_builder;
        pub mod cluster;
        pub mod cluster_filter;
        pub mod grouping_config;
        pub mod result_partitioner;
        pub mod similarity;
        pub mod time_clusterer;
    }
}

pub mod detection {
    pub mod domain {
        pub mod face_analyzer;
    }
    pub mod infrastructure;
}

pub mod media {
    pub mod domain {
        pub mod image_reader;
        pub mod timestamp_reader;
    }
    pub mod infrastructure;
}

pub mod export {
    pub mod group_export;
    pub mod manifest;
}

pub mod pipeline {
    pub mod group_photos_use_case;
    pub mod ingest_photos_use_case;
    pub mod photo_review;
    pub mod pipeline_logger;
}
