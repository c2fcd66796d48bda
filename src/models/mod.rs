pub mod episode;

pub use episode::{
    ContainerType, DiscoveredVia, EmbedCandidate, EpisodeRef, EpisodeServer, PlayerToken,
    VideoSource,
};
