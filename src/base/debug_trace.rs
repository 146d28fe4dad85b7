macro_rules! trace {
    ( @state $from:expr => $to:expr ) => {
        #[cfg(feature = "debug_trace")]
        println!("@state: {:?} -> {:?}", $from, $to);
    };

    ( @token $token:expr ) => {
        #[cfg(feature = "debug_trace")]
        println!("@token: {:?}", $token);
    };

    ( @mode $mode:expr, $token:expr ) => {
        #[cfg(feature = "debug_trace")]
        println!("@mode: {:?} <- {:?}", $mode, $token);
    };
}
