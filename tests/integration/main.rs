mod bucket_replacement;
mod codec;
mod lookup_ring;
mod ping;
mod sender_spoof;
