//! Compression options.

/// DEFLATE block encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockType {
    /// Uncompressed blocks (BTYPE=00), at most 65535 bytes each.
    Stored,
    /// Blocks using the fixed Huffman tree of RFC 1951 (BTYPE=01).
    Fixed,
    /// Blocks carrying their own Huffman trees (BTYPE=10).
    #[default]
    Dynamic,
}

impl BlockType {
    /// The two-bit BTYPE value written in the block header.
    pub fn btype(self) -> u32 {
        match self {
            Self::Stored => 0b00,
            Self::Fixed => 0b01,
            Self::Dynamic => 0b10,
        }
    }
}

/// Container around the DEFLATE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// gzip member (RFC 1952).
    #[default]
    Gzip,
    /// zlib stream (RFC 1950).
    Zlib,
    /// Raw DEFLATE stream (RFC 1951).
    Deflate,
}

/// Options for one compression call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Log block sizes, split points and improving iteration costs at `info` level.
    pub verbose: bool,
    /// Additionally log every iteration at `debug` level.
    pub verbose_more: bool,
    /// Number of cost-model refinement passes per block. Good values are
    /// 10 to 15 for small inputs and around 5 for inputs of several MB.
    /// Zero behaves like one.
    pub num_iterations: u32,
    /// Split the data into several blocks with independently chosen trees.
    pub block_splitting: bool,
    /// Choose split points after the optimal parse instead of before it.
    pub block_splitting_last: bool,
    /// Maximum number of blocks to split into, 0 for unlimited.
    pub block_splitting_max: usize,
    /// Block encoding to produce.
    pub block_type: BlockType,
    /// Size of the coarse partitions processed independently, 0 to disable.
    /// Earlier partitions still serve as LZ77 dictionary.
    pub master_block_size: usize,
}

impl Options {
    /// Default master block size (20 MB).
    pub const DEFAULT_MASTER_BLOCK_SIZE: usize = 20_000_000;

    /// Best compression: 15 iterations, splitting before the parse.
    pub const DEFAULT: Self = Self {
        verbose: false,
        verbose_more: false,
        num_iterations: 15,
        block_splitting: true,
        block_splitting_last: false,
        block_splitting_max: 15,
        block_type: BlockType::Dynamic,
        master_block_size: Self::DEFAULT_MASTER_BLOCK_SIZE,
    };

    /// Fewer iterations for large inputs.
    pub const FAST: Self = Self {
        num_iterations: 5,
        ..Self::DEFAULT
    };

    /// Create the default options.
    pub fn new() -> Self {
        Self::DEFAULT
    }

    /// Iteration count actually used, never less than one.
    pub fn iterations(&self) -> u32 {
        self.num_iterations.max(1)
    }

    /// Set the number of iterations.
    pub fn with_iterations(mut self, num_iterations: u32) -> Self {
        self.num_iterations = num_iterations;
        self
    }

    /// Enable or disable block splitting.
    pub fn with_block_splitting(mut self, enabled: bool) -> Self {
        self.block_splitting = enabled;
        self
    }

    /// Split after the optimal parse instead of before it.
    pub fn with_block_splitting_last(mut self, last: bool) -> Self {
        self.block_splitting_last = last;
        self
    }

    /// Limit the number of blocks, 0 for unlimited.
    pub fn with_block_splitting_max(mut self, max_blocks: usize) -> Self {
        self.block_splitting_max = max_blocks;
        self
    }

    /// Force a block type.
    pub fn with_block_type(mut self, block_type: BlockType) -> Self {
        self.block_type = block_type;
        self
    }

    /// Set the master block size, 0 to disable.
    pub fn with_master_block_size(mut self, size: usize) -> Self {
        self.master_block_size = size;
        self
    }

    /// Enable `info` level logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable per-iteration `debug` level logging.
    pub fn with_verbose_more(mut self, verbose_more: bool) -> Self {
        self.verbose_more = verbose_more;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::DEFAULT
    }
}
