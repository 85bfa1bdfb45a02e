pub const TYPE_REQUEST: u8 = 0x01;
pub const TYPE_RESPONSE: u8 = 0x02;

/// Bit 0 of the response flags byte.
pub const FLAG_FOUND: u8 = 0x01;

pub const DEFAULT_DEVICE_PORT: u16 = 7070;
pub const DEFAULT_SERVER_PORT: u16 = 7000;

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestHeader {
    pub kind: u8,
    pub key: u32, // Network byte order
}

impl RequestHeader {
    pub const LEN: usize = core::mem::size_of::<RequestHeader>();
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseHeader {
    pub kind: u8,
    pub key: u32,   // Network byte order
    pub value: u32, // Network byte order, meaningless unless FLAG_FOUND is set
    pub flags: u8,
}

impl ResponseHeader {
    pub const LEN: usize = core::mem::size_of::<ResponseHeader>();
}

/// Prefix of every datagram exchanged between the device and the backend.
/// Holds the requesting client so the reply can be routed back to it.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvelopeHeader {
    pub client_addr: [u8; 4],
    pub client_port: u16, // Network byte order
}

impl EnvelopeHeader {
    pub const LEN: usize = core::mem::size_of::<EnvelopeHeader>();
}
